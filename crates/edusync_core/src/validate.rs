//! crates/edusync_core/src/validate.rs
//!
//! Pure per-step validation of the onboarding record. Each step validates only
//! its own slice of the record and reports pass/fail plus field-level messages;
//! nothing here touches the outside world.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{OnboardingRecord, ALLOWED_LOGO_TYPES, MAX_LOGO_BYTES};
use crate::wizard::WizardStep;

// Same loose international shape the sign-up form uses: optional leading `+`,
// optionally parenthesized digit groups separated by spaces, dots, or hyphens.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{1,4}[)]?[-\s.]?[(]?[0-9]{1,4}[)]?[-\s.]?[0-9]{1,9}$")
        .expect("valid regex")
});

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// The outcome of validating one step's input slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepValidation {
    pub valid: bool,
    pub field_errors: BTreeMap<String, String>,
}

impl StepValidation {
    fn pass() -> Self {
        Self {
            valid: true,
            field_errors: BTreeMap::new(),
        }
    }

    fn fail(field_errors: BTreeMap<String, String>) -> Self {
        Self {
            valid: false,
            field_errors,
        }
    }
}

/// Checks whether a string has a basic `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Why a logo file was refused at upload time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogoFileError {
    #[error("Please upload a valid image file (JPEG, PNG, GIF, or WebP)")]
    UnsupportedType,
    #[error("File size must be less than 5MB")]
    TooLarge,
}

/// Gate on accepting a logo file into the record. Violations block the upload
/// itself, never step advancement (the logo step is always skippable).
pub fn check_logo_file(content_type: &str, size: usize) -> Result<(), LogoFileError> {
    if !ALLOWED_LOGO_TYPES.contains(&content_type) {
        return Err(LogoFileError::UnsupportedType);
    }
    if size > MAX_LOGO_BYTES {
        return Err(LogoFileError::TooLarge);
    }
    Ok(())
}

/// Validates the record slice belonging to `step`.
///
/// The review step re-checks the two non-skippable fields (school name and
/// principal name) so a record cannot reach commit with values that were valid
/// only at the time their steps were visited.
pub fn validate_step(step: WizardStep, record: &OnboardingRecord) -> StepValidation {
    match step {
        WizardStep::SchoolName => validate_school_name(&record.school_name),
        WizardStep::SchoolAddress => validate_school_address(&record.school_address),
        WizardStep::UnhcrStatus => {
            // An unresolved tri-state blocks advancement without producing a
            // field error; the UI disables Continue instead of shouting.
            if record.unhcr_status.is_some() {
                StepValidation::pass()
            } else {
                StepValidation::fail(BTreeMap::new())
            }
        }
        WizardStep::SchoolLogo => StepValidation::pass(),
        WizardStep::PrincipalInfo => {
            validate_principal_info(&record.principal_name, &record.principal_phone)
        }
        WizardStep::InviteTeachers => StepValidation::pass(),
        WizardStep::Review => {
            let mut errors = BTreeMap::new();
            errors.extend(validate_school_name(&record.school_name).field_errors);
            errors.extend(
                validate_principal_info(&record.principal_name, &record.principal_phone)
                    .field_errors,
            );
            if record.unhcr_status.is_none() {
                return StepValidation::fail(errors);
            }
            if errors.is_empty() {
                StepValidation::pass()
            } else {
                StepValidation::fail(errors)
            }
        }
        WizardStep::Success => StepValidation::pass(),
    }
}

fn validate_school_name(name: &str) -> StepValidation {
    let trimmed = name.trim();
    let mut errors = BTreeMap::new();
    if trimmed.chars().count() < 3 {
        errors.insert(
            "schoolName".to_string(),
            "School name must be at least 3 characters".to_string(),
        );
    } else if trimmed.chars().count() > 100 {
        errors.insert(
            "schoolName".to_string(),
            "School name must not exceed 100 characters".to_string(),
        );
    }
    if errors.is_empty() {
        StepValidation::pass()
    } else {
        StepValidation::fail(errors)
    }
}

fn validate_school_address(address: &str) -> StepValidation {
    if address.chars().count() > 200 {
        let mut errors = BTreeMap::new();
        errors.insert(
            "schoolAddress".to_string(),
            "Address must not exceed 200 characters".to_string(),
        );
        StepValidation::fail(errors)
    } else {
        StepValidation::pass()
    }
}

fn validate_principal_info(name: &str, phone: &str) -> StepValidation {
    let trimmed = name.trim();
    let mut errors = BTreeMap::new();
    if trimmed.chars().count() < 2 {
        errors.insert(
            "principalName".to_string(),
            "Name must be at least 2 characters".to_string(),
        );
    } else if trimmed.chars().count() > 100 {
        errors.insert(
            "principalName".to_string(),
            "Name must not exceed 100 characters".to_string(),
        );
    }
    if !phone.is_empty() && !PHONE_RE.is_match(phone) {
        errors.insert(
            "principalPhone".to_string(),
            "Please enter a valid phone number".to_string(),
        );
    }
    if errors.is_empty() {
        StepValidation::pass()
    } else {
        StepValidation::fail(errors)
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StepPatch;

    fn record_with_name(name: &str) -> OnboardingRecord {
        let mut record = OnboardingRecord::default();
        record.apply(StepPatch::SchoolName(name.to_string()));
        record
    }

    #[test]
    fn school_name_length_bounds() {
        assert!(validate_step(WizardStep::SchoolName, &record_with_name("abc")).valid);
        assert!(validate_step(WizardStep::SchoolName, &record_with_name(&"a".repeat(100))).valid);
        assert!(!validate_step(WizardStep::SchoolName, &record_with_name("ab")).valid);
        assert!(!validate_step(WizardStep::SchoolName, &record_with_name(&"a".repeat(101))).valid);
    }

    #[test]
    fn school_name_is_trimmed_before_measuring() {
        assert!(!validate_step(WizardStep::SchoolName, &record_with_name("  ab  ")).valid);
        assert!(validate_step(WizardStep::SchoolName, &record_with_name("  abc  ")).valid);
    }

    #[test]
    fn address_is_optional_with_a_cap() {
        let mut record = OnboardingRecord::default();
        assert!(validate_step(WizardStep::SchoolAddress, &record).valid);

        record.apply(StepPatch::SchoolAddress("123 Example St".to_string()));
        assert!(validate_step(WizardStep::SchoolAddress, &record).valid);

        record.apply(StepPatch::SchoolAddress("a".repeat(201)));
        let result = validate_step(WizardStep::SchoolAddress, &record);
        assert!(!result.valid);
        assert!(result.field_errors.contains_key("schoolAddress"));
    }

    #[test]
    fn unhcr_status_blocks_without_field_error_until_decided() {
        let mut record = OnboardingRecord::default();
        let result = validate_step(WizardStep::UnhcrStatus, &record);
        assert!(!result.valid);
        assert!(result.field_errors.is_empty());

        record.apply(StepPatch::UnhcrStatus(true));
        assert!(validate_step(WizardStep::UnhcrStatus, &record).valid);
        record.apply(StepPatch::UnhcrStatus(false));
        assert!(validate_step(WizardStep::UnhcrStatus, &record).valid);
    }

    #[test]
    fn principal_name_and_phone_rules() {
        let mut record = OnboardingRecord::default();
        record.apply(StepPatch::PrincipalInfo {
            name: "Jo".to_string(),
            phone: String::new(),
        });
        assert!(validate_step(WizardStep::PrincipalInfo, &record).valid);

        record.apply(StepPatch::PrincipalInfo {
            name: "J".to_string(),
            phone: String::new(),
        });
        assert!(!validate_step(WizardStep::PrincipalInfo, &record).valid);

        record.apply(StepPatch::PrincipalInfo {
            name: "Dr. Jane Smith".to_string(),
            phone: "+1 (555) 1234567".to_string(),
        });
        assert!(validate_step(WizardStep::PrincipalInfo, &record).valid);

        record.apply(StepPatch::PrincipalInfo {
            name: "Dr. Jane Smith".to_string(),
            phone: "not a phone".to_string(),
        });
        let result = validate_step(WizardStep::PrincipalInfo, &record);
        assert!(!result.valid);
        assert!(result.field_errors.contains_key("principalPhone"));
    }

    #[test]
    fn logo_and_invite_steps_never_block_advancement() {
        let record = OnboardingRecord::default();
        assert!(validate_step(WizardStep::SchoolLogo, &record).valid);
        assert!(validate_step(WizardStep::InviteTeachers, &record).valid);
    }

    #[test]
    fn logo_file_constraints() {
        assert!(check_logo_file("image/png", 1024).is_ok());
        assert!(check_logo_file("image/webp", MAX_LOGO_BYTES).is_ok());
        assert_eq!(
            check_logo_file("image/svg+xml", 1024),
            Err(LogoFileError::UnsupportedType)
        );
        assert_eq!(
            check_logo_file("image/png", MAX_LOGO_BYTES + 1),
            Err(LogoFileError::TooLarge)
        );
    }

    #[test]
    fn review_recheck_catches_regressed_fields() {
        let mut record = record_with_name("Test School");
        record.apply(StepPatch::UnhcrStatus(false));
        record.apply(StepPatch::PrincipalInfo {
            name: "Dr. Jane Smith".to_string(),
            phone: String::new(),
        });
        assert!(validate_step(WizardStep::Review, &record).valid);

        record.apply(StepPatch::SchoolName("ab".to_string()));
        let result = validate_step(WizardStep::Review, &record);
        assert!(!result.valid);
        assert!(result.field_errors.contains_key("schoolName"));
    }

    #[test]
    fn review_requires_resolved_unhcr_status() {
        let mut record = record_with_name("Test School");
        record.apply(StepPatch::PrincipalInfo {
            name: "Dr. Jane Smith".to_string(),
            phone: String::new(),
        });
        assert!(!validate_step(WizardStep::Review, &record).valid);
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("teacher@example.com"));
        assert!(is_valid_email("a.b+c@x.co.uk"));
        assert!(!is_valid_email("teacher@example"));
        assert!(!is_valid_email("teacher example@x.com"));
        assert!(!is_valid_email("@x.com"));
    }
}
