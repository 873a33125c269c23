//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-user school session
//! handle the wizard controller hands its commit result to.

use std::collections::HashMap;
use std::sync::Arc;

use edusync_core::committer::OnboardingCommitter;
use edusync_core::controller::OnboardingController;
use edusync_core::domain::{CommitResult, School};
use edusync_core::ports::{
    AssetStore, CredentialStore, InvitationSender, SchoolDirectory, SchoolSession,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub directory: Arc<dyn SchoolDirectory>,
    pub credentials: Arc<dyn CredentialStore>,
    pub assets: Arc<dyn AssetStore>,
    pub invitations: Arc<dyn InvitationSender>,
    pub schools: Arc<ActiveSchools>,
    /// Live wizard sessions, keyed by session id. Process-local by design:
    /// an abandoned wizard disappears with its session, and a restart drops
    /// all in-progress onboarding attempts. Each controller sits behind its
    /// own lock so one session's in-flight commit never blocks another's.
    pub wizards: Mutex<HashMap<Uuid, Arc<Mutex<OnboardingController>>>>,
}

impl AppState {
    /// Builds the commit saga over the state's ports.
    pub fn committer(&self) -> OnboardingCommitter {
        OnboardingCommitter::new(
            self.directory.clone(),
            self.assets.clone(),
            self.invitations.clone(),
        )
    }

    /// The school-session handle injected into a controller for `user_id`.
    pub fn school_session_for(&self, user_id: Uuid) -> Arc<dyn SchoolSession> {
        Arc::new(SchoolSessionHandle {
            registry: self.schools.clone(),
            user_id,
        })
    }
}

//=========================================================================================
// ActiveSchools (The Adopted-School Registry)
//=========================================================================================

/// In-memory registry of the school each signed-in principal is operating,
/// filled by completed onboarding commits. The database remains authoritative;
/// this mirrors the client-side school context.
#[derive(Default)]
pub struct ActiveSchools {
    inner: std::sync::Mutex<HashMap<Uuid, School>>,
}

impl ActiveSchools {
    pub fn set(&self, user_id: Uuid, school: School) {
        self.inner.lock().unwrap().insert(user_id, school);
    }

    pub fn get(&self, user_id: Uuid) -> Option<School> {
        self.inner.lock().unwrap().get(&user_id).cloned()
    }
}

/// One principal's handle into the registry.
struct SchoolSessionHandle {
    registry: Arc<ActiveSchools>,
    user_id: Uuid,
}

impl SchoolSession for SchoolSessionHandle {
    fn adopt(&self, result: &CommitResult) {
        self.registry.set(self.user_id, result.school.clone());
    }
}
