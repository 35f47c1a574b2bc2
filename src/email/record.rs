use serde::{Deserialize, Serialize};
use std::fmt;

/// Role category of an address
///
/// Variant order is the tie-break order between equally scored sightings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Contact,
    Support,
    Info,
    Admin,
    Other,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Support => "support",
            Self::Info => "info",
            Self::Admin => "admin",
            Self::Other => "other",
        }
    }

    pub fn all() -> [EmailType; 5] {
        [
            Self::Contact,
            Self::Support,
            Self::Info,
            Self::Admin,
            Self::Other,
        ]
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final, deduplicated result for one address
///
/// Serializes with the field names consumers of the result set expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub id: String,
    /// Normalized address
    pub email: String,
    pub domain: String,
    pub is_valid: bool,
    /// Source description of the best sighting
    pub source: String,
    /// 0-100
    pub confidence: u8,
    #[serde(rename = "type")]
    pub email_type: EmailType,
}
