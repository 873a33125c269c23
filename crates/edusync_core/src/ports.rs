//! crates/edusync_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AuthSession, CommitResult, Invitation, Profile, School, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, storage).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The relational directory of schools and user profiles.
#[async_trait]
pub trait SchoolDirectory: Send + Sync {
    /// Inserts a new school row. One call creates exactly one school.
    async fn create_school(
        &self,
        name: &str,
        address: Option<&str>,
        unhcr_status: bool,
    ) -> PortResult<School>;

    /// Patches only the logo URL of an existing school.
    async fn update_school_logo(&self, school_id: Uuid, logo_url: &str) -> PortResult<School>;

    async fn get_school(&self, school_id: Uuid) -> PortResult<School>;

    /// Inserts or replaces the profile row keyed by user id.
    async fn upsert_profile(
        &self,
        user_id: Uuid,
        school_id: Uuid,
        role: &str,
        full_name: &str,
    ) -> PortResult<Profile>;

    /// Fetches a profile by user id. `Ok(None)` marks "no profile yet", which
    /// callers treat as "onboarding not completed".
    async fn fetch_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>>;
}

/// Blob storage for school assets (logos).
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores a blob under the given path within the school-assets bucket.
    async fn store(&self, path: &str, bytes: &[u8], content_type: &str) -> PortResult<()>;

    /// Returns the public URL a stored path is served from.
    fn public_url(&self, path: &str) -> String;
}

/// Dispatch of teacher invitation emails.
#[async_trait]
pub trait InvitationSender: Send + Sync {
    async fn send(
        &self,
        school_id: Uuid,
        school_name: &str,
        emails: &[String],
    ) -> PortResult<Vec<Invitation>>;
}

/// The surrounding application session that adopts the commit result once the
/// wizard finishes. Injected explicitly rather than reached ambiently.
pub trait SchoolSession: Send + Sync {
    fn adopt(&self, result: &CommitResult);
}

/// Credential and auth-session persistence consumed by the auth endpoints.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession>;

    /// Resolves a session id to its user id, rejecting expired sessions.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
