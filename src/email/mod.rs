//! Email data model
//!
//! `EmailCandidate` is a single sighting produced by extraction, `EmailRecord`
//! the deduplicated result exposed to consumers.

mod candidate;
mod normalize;
mod record;

pub use candidate::{Detection, EmailCandidate, SourceCategory};
pub use normalize::{normalize_address, split_address, strip_invisible};
pub use record::{EmailRecord, EmailType};
