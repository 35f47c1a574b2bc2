//! Confidence scoring
//!
//! The validation level picks a base score and a band; source, detection and
//! role adjust it by at most ten points in total, and the result never leaves
//! the band.

use crate::email::{Detection, EmailType, SourceCategory};
use crate::validate::ValidationLevel;

/// Largest total adjustment applied to a base score
const MAX_ADJUSTMENT: i32 = 10;

/// Base score and inclusive band for a validation level
pub fn base_band(level: ValidationLevel) -> (i32, i32, i32) {
    match level {
        ValidationLevel::SyntaxFailed => (10, 0, 20),
        ValidationLevel::DomainFailed => (15, 0, 20),
        ValidationLevel::SyntaxOnly => (40, 30, 50),
        ValidationLevel::DomainUnknown => (35, 30, 50),
        ValidationLevel::MailboxRejected => (40, 30, 50),
        ValidationLevel::MailboxUnknown => (70, 60, 85),
        ValidationLevel::DomainResolved => (72, 60, 85),
        ValidationLevel::MailboxConfirmed => (94, 90, 99),
    }
}

fn category_adjustment(category: SourceCategory) -> i32 {
    match category {
        SourceCategory::ContactPage | SourceCategory::StaffDirectory | SourceCategory::SupportPage => {
            10
        }
        SourceCategory::AboutPage | SourceCategory::PressPage | SourceCategory::CareersPage => 5,
        SourceCategory::Footer | SourceCategory::UploadedList => 0,
        SourceCategory::PageContent => -5,
    }
}

fn detection_adjustment(detection: Detection) -> i32 {
    match detection {
        Detection::MailtoLink => 5,
        Detection::PlainText => 0,
        Detection::Obfuscated => -10,
    }
}

fn type_adjustment(email_type: EmailType) -> i32 {
    match email_type {
        EmailType::Contact | EmailType::Info | EmailType::Support => 3,
        EmailType::Admin | EmailType::Other => 0,
    }
}

/// Combines validation, source and role signals into a 0-100 confidence
///
/// Pure: identical inputs always give the identical score.
pub fn score(
    level: ValidationLevel,
    category: SourceCategory,
    detection: Detection,
    email_type: EmailType,
) -> u8 {
    let (base, low, high) = base_band(level);
    let adjustment = (category_adjustment(category)
        + detection_adjustment(detection)
        + type_adjustment(email_type))
    .clamp(-MAX_ADJUSTMENT, MAX_ADJUSTMENT);

    (base + adjustment).clamp(low, high).clamp(0, 100) as u8
}
