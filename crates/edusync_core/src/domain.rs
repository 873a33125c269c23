//! crates/edusync_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Maximum accepted logo upload size in bytes (5 MiB).
pub const MAX_LOGO_BYTES: usize = 5_242_880;

/// Content types accepted for a school logo upload.
pub const ALLOWED_LOGO_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// The authenticated user driving an onboarding attempt.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A logo file accepted into the wizard, held in memory until commit.
///
/// A non-null asset always carries a non-empty preview data URI; the two
/// fields are only ever set together.
#[derive(Debug, Clone)]
pub struct LogoAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
    pub preview_data_uri: String,
}

/// The in-memory accumulator for one onboarding attempt.
///
/// Owned exclusively by a `WizardSession`; mutated only through whole-field
/// patches so a later step can never silently drop an earlier step's data.
#[derive(Debug, Clone, Default)]
pub struct OnboardingRecord {
    pub school_name: String,
    pub school_address: String,
    /// Tri-state: `None` means the user has not decided yet. Must be resolved
    /// before the record is eligible for commit.
    pub unhcr_status: Option<bool>,
    pub logo: Option<LogoAsset>,
    pub principal_name: String,
    pub principal_phone: String,
    /// Insertion order is invitation order. Entries are stored lowercase and
    /// are unique case-insensitively.
    teacher_emails: Vec<String>,
}

/// A whole-field patch for one step's slice of the record.
#[derive(Debug, Clone)]
pub enum StepPatch {
    SchoolName(String),
    SchoolAddress(String),
    UnhcrStatus(bool),
    Logo(Option<LogoAsset>),
    PrincipalInfo { name: String, phone: String },
}

/// Why an email add-attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailAddError {
    #[error("Please enter an email address")]
    Empty,
    #[error("Please enter a valid email address")]
    Invalid,
    #[error("This email has already been added")]
    Duplicate,
}

impl OnboardingRecord {
    /// Applies a whole-field patch, replacing that step's data entirely.
    pub fn apply(&mut self, patch: StepPatch) {
        match patch {
            StepPatch::SchoolName(name) => self.school_name = name,
            StepPatch::SchoolAddress(address) => self.school_address = address,
            StepPatch::UnhcrStatus(status) => self.unhcr_status = Some(status),
            StepPatch::Logo(logo) => self.logo = logo,
            StepPatch::PrincipalInfo { name, phone } => {
                self.principal_name = name;
                self.principal_phone = phone;
            }
        }
    }

    pub fn teacher_emails(&self) -> &[String] {
        &self.teacher_emails
    }

    /// Adds a teacher email, normalizing to lowercase.
    ///
    /// Rejects empty input, malformed addresses, and case-insensitive
    /// duplicates; the list is left unchanged on rejection.
    pub fn add_teacher_email(&mut self, email: &str) -> Result<(), EmailAddError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(EmailAddError::Empty);
        }
        if !crate::validate::is_valid_email(&normalized) {
            return Err(EmailAddError::Invalid);
        }
        if self.teacher_emails.contains(&normalized) {
            return Err(EmailAddError::Duplicate);
        }
        self.teacher_emails.push(normalized);
        Ok(())
    }

    /// Removes a teacher email (case-insensitive). Returns whether it was present.
    pub fn remove_teacher_email(&mut self, email: &str) -> bool {
        let normalized = email.trim().to_lowercase();
        let before = self.teacher_emails.len();
        self.teacher_emails.retain(|e| *e != normalized);
        self.teacher_emails.len() != before
    }

    /// Clears the invitation list. Used by the skip path on the invite step.
    pub fn clear_teacher_emails(&mut self) {
        self.teacher_emails.clear();
    }
}

//=========================================================================================
// Commit output types
//=========================================================================================

/// A school row as created by the commit sequence.
#[derive(Debug, Clone, Serialize)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub unhcr_status: bool,
    pub logo_url: Option<String>,
}

/// A user profile tied to a school.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub school_id: Option<Uuid>,
    pub role: String,
    pub full_name: String,
}

/// One dispatched (or pending) teacher invitation.
#[derive(Debug, Clone, Serialize)]
pub struct Invitation {
    pub email: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

/// Everything a successful commit produced. Ownership transfers to the
/// surrounding school session once the wizard reaches its success step.
#[derive(Debug, Clone, Serialize)]
pub struct CommitResult {
    pub school: School,
    pub profile: Profile,
    pub logo_url: Option<String>,
    pub invitations: Vec<Invitation>,
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_replaces_whole_fields() {
        let mut record = OnboardingRecord::default();
        record.apply(StepPatch::SchoolName("Test School".to_string()));
        record.apply(StepPatch::PrincipalInfo {
            name: "Dr. Jane Smith".to_string(),
            phone: String::new(),
        });
        assert_eq!(record.school_name, "Test School");
        assert_eq!(record.principal_name, "Dr. Jane Smith");
        assert_eq!(record.unhcr_status, None);

        record.apply(StepPatch::UnhcrStatus(false));
        assert_eq!(record.unhcr_status, Some(false));
    }

    #[test]
    fn add_email_normalizes_to_lowercase() {
        let mut record = OnboardingRecord::default();
        record.add_teacher_email("Teacher@X.com").unwrap();
        assert_eq!(record.teacher_emails(), ["teacher@x.com"]);
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let mut record = OnboardingRecord::default();
        record.add_teacher_email("Teacher@X.com").unwrap();
        let err = record.add_teacher_email("teacher@x.com").unwrap_err();
        assert_eq!(err, EmailAddError::Duplicate);
        assert_eq!(record.teacher_emails().len(), 1);
    }

    #[test]
    fn empty_and_malformed_emails_are_rejected() {
        let mut record = OnboardingRecord::default();
        assert_eq!(record.add_teacher_email("  "), Err(EmailAddError::Empty));
        assert_eq!(
            record.add_teacher_email("not-an-email"),
            Err(EmailAddError::Invalid)
        );
        assert_eq!(
            record.add_teacher_email("missing@tld"),
            Err(EmailAddError::Invalid)
        );
        assert!(record.teacher_emails().is_empty());
    }

    #[test]
    fn remove_email_is_case_insensitive() {
        let mut record = OnboardingRecord::default();
        record.add_teacher_email("a@b.com").unwrap();
        assert!(record.remove_teacher_email("A@B.COM"));
        assert!(!record.remove_teacher_email("a@b.com"));
        assert!(record.teacher_emails().is_empty());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut record = OnboardingRecord::default();
        for email in ["c@x.org", "a@x.org", "b@x.org"] {
            record.add_teacher_email(email).unwrap();
        }
        assert_eq!(record.teacher_emails(), ["c@x.org", "a@x.org", "b@x.org"]);
    }
}
