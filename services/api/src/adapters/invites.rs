//! services/api/src/adapters/invites.rs
//!
//! Implementation of the `InvitationSender` port. Actual delivery goes through
//! an external mail function that is not wired up yet; this adapter records
//! the batch and reports every invitation as pending, matching what the
//! dashboard shows today.

use async_trait::async_trait;
use chrono::Utc;
use edusync_core::domain::Invitation;
use edusync_core::ports::{InvitationSender, PortResult};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct LoggedInvitationSender;

#[async_trait]
impl InvitationSender for LoggedInvitationSender {
    async fn send(
        &self,
        school_id: Uuid,
        school_name: &str,
        emails: &[String],
    ) -> PortResult<Vec<Invitation>> {
        let now = Utc::now();
        let invitations: Vec<Invitation> = emails
            .iter()
            .map(|email| Invitation {
                email: email.clone(),
                status: "pending".to_string(),
                sent_at: now,
            })
            .collect();

        info!(
            school_id = %school_id,
            school_name,
            count = invitations.len(),
            "Teacher invitations queued"
        );
        Ok(invitations)
    }
}
