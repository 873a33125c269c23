//! crates/edusync_core/src/committer.rs
//!
//! The multi-stage remote commit that turns a finished onboarding record into
//! real rows: create the school, optionally store the logo, upsert the
//! principal's profile, and dispatch teacher invitations. The sequence is
//! deliberately not atomic; each stage's failure policy is documented on
//! `commit`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::{CommitResult, Invitation, OnboardingRecord, Principal};
use crate::ports::{AssetStore, InvitationSender, PortError, SchoolDirectory};
use crate::validate;
use crate::wizard::WizardStep;

/// A failed commit attempt. `Display` is exactly the failing stage's message,
/// which the review step shows verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// The record was not commit-eligible, or no stage was ever started.
    #[error("{0}")]
    Precondition(String),
    /// Stage 1 (school creation) failed. Nothing was written.
    #[error("{0}")]
    SchoolCreation(String),
    /// Stage 3 (profile upsert) failed. The stage-1 school row remains.
    #[error("{0}")]
    ProfileUpsert(String),
}

// PortError's Display wraps messages with context; the review step wants the
// raw remote message, so unwrap it here.
fn port_message(err: PortError) -> String {
    match err {
        PortError::NotFound(msg) | PortError::Unexpected(msg) => msg,
        PortError::Unauthorized => "Unauthorized".to_string(),
    }
}

/// Executes the onboarding commit sequence against the injected ports.
#[derive(Clone)]
pub struct OnboardingCommitter {
    directory: Arc<dyn SchoolDirectory>,
    assets: Arc<dyn AssetStore>,
    invitations: Arc<dyn InvitationSender>,
}

impl OnboardingCommitter {
    pub fn new(
        directory: Arc<dyn SchoolDirectory>,
        assets: Arc<dyn AssetStore>,
        invitations: Arc<dyn InvitationSender>,
    ) -> Self {
        Self {
            directory,
            assets,
            invitations,
        }
    }

    /// Runs the four commit stages strictly in order.
    ///
    /// Failure policy per stage:
    /// 1. Create school - fatal; nothing to compensate.
    /// 2. Store logo and patch the school row - non-fatal; the school simply
    ///    keeps a null logo URL. The patch is never attempted when the store
    ///    itself failed.
    /// 3. Upsert profile - fatal; the stage-1 school row is *not* rolled back.
    ///    A retry re-runs the whole sequence and can create a second school
    ///    row; there is no idempotency key today.
    /// 4. Send invitations - failures are swallowed; the stage reports the
    ///    attempted batch as pending either way.
    ///
    /// Overall success iff stages 1 and 3 both succeed.
    pub async fn commit(
        &self,
        principal: &Principal,
        record: &OnboardingRecord,
    ) -> Result<CommitResult, CommitError> {
        // Precondition: the record must still pass the review-step checks.
        let review = validate::validate_step(WizardStep::Review, record);
        if !review.valid {
            return Err(CommitError::Precondition(
                "Onboarding details are incomplete. Please review the previous steps.".to_string(),
            ));
        }
        let unhcr_status = record
            .unhcr_status
            .ok_or_else(|| CommitError::Precondition("UNHCR status has not been set".to_string()))?;

        // Stage 1: create the school row.
        let name = record.school_name.trim();
        let address = {
            let trimmed = record.school_address.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        };
        let mut school = self
            .directory
            .create_school(name, address, unhcr_status)
            .await
            .map_err(|e| CommitError::SchoolCreation(port_message(e)))?;
        info!(school_id = %school.id, name, "School created");

        // Stage 2: logo upload, if one was accepted.
        let mut logo_url = None;
        if let Some(logo) = &record.logo {
            let ext = logo
                .file_name
                .rsplit('.')
                .next()
                .unwrap_or("png");
            let path = format!(
                "school-logos/{}-{}.{}",
                school.id,
                Utc::now().timestamp_millis(),
                ext
            );
            match self
                .assets
                .store(&path, &logo.bytes, &logo.content_type)
                .await
            {
                Ok(()) => {
                    let url = self.assets.public_url(&path);
                    match self.directory.update_school_logo(school.id, &url).await {
                        Ok(updated) => {
                            school = updated;
                            logo_url = Some(url);
                        }
                        Err(e) => {
                            warn!(school_id = %school.id, error = %e, "Failed to patch school logo URL");
                        }
                    }
                }
                Err(e) => {
                    warn!(school_id = %school.id, error = %e, "Logo upload failed; continuing without a logo");
                }
            }
        }

        // Stage 3: tie the principal's profile to the new school.
        let full_name = {
            let trimmed = record.principal_name.trim();
            if trimmed.is_empty() {
                // Fall back to the mailbox name, as the sign-up flow does.
                principal.email.split('@').next().unwrap_or_default()
            } else {
                trimmed
            }
        };
        let profile = self
            .directory
            .upsert_profile(principal.id, school.id, "principal", full_name)
            .await
            .map_err(|e| CommitError::ProfileUpsert(port_message(e)))?;
        info!(user_id = %principal.id, school_id = %school.id, "Principal profile linked");

        // Stage 4: invitation dispatch, fire-and-forget.
        let emails = record.teacher_emails();
        let invitations = if emails.is_empty() {
            Vec::new()
        } else {
            match self.invitations.send(school.id, &school.name, emails).await {
                Ok(sent) => sent,
                Err(e) => {
                    warn!(school_id = %school.id, error = %e, "Invitation dispatch failed");
                    let now = Utc::now();
                    emails
                        .iter()
                        .map(|email| Invitation {
                            email: email.clone(),
                            status: "pending".to_string(),
                            sent_at: now,
                        })
                        .collect()
                }
            }
        };

        Ok(CommitResult {
            school,
            profile,
            logo_url,
            invitations,
        })
    }
}

//=========================================================================================
// Tests
//=========================================================================================
