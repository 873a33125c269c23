//! services/api/src/web/testsupport.rs
//!
//! Stub port implementations and an `AppState` builder shared by the web
//! handler tests. The stubs keep their rows in plain maps so tests can seed
//! and inspect them directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edusync_core::controller::OnboardingController;
use edusync_core::domain::{
    AuthSession, Invitation, Principal, Profile, School, UserCredentials,
};
use edusync_core::ports::{
    AssetStore, CredentialStore, InvitationSender, PortError, PortResult, SchoolDirectory,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Config;
use crate::web::state::{ActiveSchools, AppState};

#[derive(Default)]
pub(crate) struct StubDirectory {
    pub schools: std::sync::Mutex<HashMap<Uuid, School>>,
    pub profiles: std::sync::Mutex<HashMap<Uuid, Profile>>,
}

#[async_trait]
impl SchoolDirectory for StubDirectory {
    async fn create_school(
        &self,
        name: &str,
        address: Option<&str>,
        unhcr_status: bool,
    ) -> PortResult<School> {
        let school = School {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: address.map(str::to_string),
            unhcr_status,
            logo_url: None,
        };
        self.schools.lock().unwrap().insert(school.id, school.clone());
        Ok(school)
    }

    async fn update_school_logo(&self, school_id: Uuid, logo_url: &str) -> PortResult<School> {
        let mut schools = self.schools.lock().unwrap();
        let school = schools
            .get_mut(&school_id)
            .ok_or_else(|| PortError::NotFound(format!("School {} not found", school_id)))?;
        school.logo_url = Some(logo_url.to_string());
        Ok(school.clone())
    }

    async fn get_school(&self, school_id: Uuid) -> PortResult<School> {
        self.schools
            .lock()
            .unwrap()
            .get(&school_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("School {} not found", school_id)))
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        school_id: Uuid,
        role: &str,
        full_name: &str,
    ) -> PortResult<Profile> {
        let profile = Profile {
            id: user_id,
            school_id: Some(school_id),
            role: role.to_string(),
            full_name: full_name.to_string(),
        };
        self.profiles.lock().unwrap().insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn fetch_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }
}

pub(crate) struct StubAssets;

#[async_trait]
impl AssetStore for StubAssets {
    async fn store(&self, _path: &str, _bytes: &[u8], _content_type: &str) -> PortResult<()> {
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("http://assets.test/{}", path)
    }
}

pub(crate) struct StubInvitations;

#[async_trait]
impl InvitationSender for StubInvitations {
    async fn send(
        &self,
        _school_id: Uuid,
        _school_name: &str,
        emails: &[String],
    ) -> PortResult<Vec<Invitation>> {
        Ok(emails
            .iter()
            .map(|email| Invitation {
                email: email.clone(),
                status: "pending".to_string(),
                sent_at: Utc::now(),
            })
            .collect())
    }
}

pub(crate) struct StubCredentials;

#[async_trait]
impl CredentialStore for StubCredentials {
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<UserCredentials> {
        Ok(UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        Err(PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        Err(PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession> {
        Ok(AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        })
    }

    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
        Err(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        Ok(())
    }
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: tracing::Level::INFO,
        asset_root: PathBuf::from("/tmp/edusync-test-assets"),
        asset_base_url: "http://assets.test".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
    }
}

/// Builds an `AppState` over the stubs, handing back the directory so tests
/// can seed schools and profiles.
pub(crate) fn test_state() -> (Arc<AppState>, Arc<StubDirectory>) {
    let directory = Arc::new(StubDirectory::default());
    let state = Arc::new(AppState {
        config: Arc::new(test_config()),
        directory: directory.clone(),
        credentials: Arc::new(StubCredentials),
        assets: Arc::new(StubAssets),
        invitations: Arc::new(StubInvitations),
        schools: Arc::new(ActiveSchools::default()),
        wizards: Mutex::new(HashMap::new()),
    });
    (state, directory)
}

pub(crate) fn principal(email: &str) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        email: email.to_string(),
    }
}

/// Registers a fresh wizard session for `principal` and returns it alongside
/// its id, the way `create_session` does.
pub(crate) async fn register_session(
    state: &AppState,
    principal: &Principal,
) -> (Uuid, Arc<Mutex<OnboardingController>>) {
    let controller = OnboardingController::new(
        principal.clone(),
        state.committer(),
        state.school_session_for(principal.id),
    );
    let id = Uuid::new_v4();
    let entry = Arc::new(Mutex::new(controller));
    state.wizards.lock().await.insert(id, entry.clone());
    (id, entry)
}
