use serde::{Deserialize, Serialize};
use std::fmt;

/// Where on a site an address was seen
///
/// Variant order doubles as the tie-break order when two sightings of one
/// address score the same: earlier variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceCategory {
    #[serde(rename = "contact page")]
    ContactPage,
    #[serde(rename = "staff directory")]
    StaffDirectory,
    #[serde(rename = "support page")]
    SupportPage,
    #[serde(rename = "about page")]
    AboutPage,
    #[serde(rename = "careers page")]
    CareersPage,
    #[serde(rename = "press page")]
    PressPage,
    #[serde(rename = "footer")]
    Footer,
    #[serde(rename = "page content")]
    PageContent,
    #[serde(rename = "uploaded list")]
    UploadedList,
}

impl SourceCategory {
    /// Human-readable label, also used as the record's source description
    pub fn label(&self) -> &'static str {
        match self {
            Self::ContactPage => "contact page",
            Self::StaffDirectory => "staff directory",
            Self::SupportPage => "support page",
            Self::AboutPage => "about page",
            Self::CareersPage => "careers page",
            Self::PressPage => "press page",
            Self::Footer => "footer",
            Self::PageContent => "page content",
            Self::UploadedList => "uploaded list",
        }
    }

    /// Maps a keyword found in a URL path or heading to a category
    ///
    /// Returns None when `text` carries none of the known keywords.
    pub fn from_keywords(text: &str) -> Option<Self> {
        const KEYWORDS: &[(&str, SourceCategory)] = &[
            ("contact", SourceCategory::ContactPage),
            ("staff", SourceCategory::StaffDirectory),
            ("team", SourceCategory::StaffDirectory),
            ("support", SourceCategory::SupportPage),
            ("about", SourceCategory::AboutPage),
            ("careers", SourceCategory::CareersPage),
            ("jobs", SourceCategory::CareersPage),
            ("press", SourceCategory::PressPage),
        ];

        let lower = text.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, category)| *category)
    }

    /// Pages where a generic role address is most likely the main contact
    pub fn is_contact_flavored(&self) -> bool {
        matches!(self, Self::ContactPage | Self::AboutPage | Self::Footer)
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the address appeared in the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    /// `href="mailto:..."`
    MailtoLink,
    /// Plain text matching the address grammar
    PlainText,
    /// Decoded from `name [at] host [dot] tld` style text
    Obfuscated,
}

/// One sighting of an address, before validation and scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCandidate {
    /// Text as found in the page (after deobfuscation)
    pub raw: String,
    /// Normalized address
    pub address: String,
    pub domain: String,
    /// URL of the page the address was found on; empty for uploaded lists
    pub source_page: String,
    pub category: SourceCategory,
    pub detection: Detection,
}

impl EmailCandidate {
    pub fn local_part(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map(|(local, _)| local)
            .unwrap_or(&self.address)
    }
}
