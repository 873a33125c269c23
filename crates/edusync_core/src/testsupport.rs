//! crates/edusync_core/src/testsupport.rs
//!
//! Mock port implementations shared by the committer and controller tests.
//! Each mock counts its calls and can be armed to fail a specific operation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{CommitResult, Invitation, Profile, School};
use crate::ports::{
    AssetStore, InvitationSender, PortError, PortResult, SchoolDirectory, SchoolSession,
};

#[derive(Default)]
pub struct MockDirectory {
    created_schools: AtomicUsize,
    logo_patches: AtomicUsize,
    profile_upserts: AtomicUsize,
    fail_create_school: Mutex<Option<String>>,
    fail_profile_upsert: Mutex<Option<String>>,
}

impl MockDirectory {
    pub fn fail_create_school(&self, message: &str) {
        *self.fail_create_school.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_profile_upsert(&self, message: &str) {
        *self.fail_profile_upsert.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_profile_upsert_failure(&self) {
        *self.fail_profile_upsert.lock().unwrap() = None;
    }

    pub fn created_schools(&self) -> usize {
        self.created_schools.load(Ordering::SeqCst)
    }

    pub fn logo_patches(&self) -> usize {
        self.logo_patches.load(Ordering::SeqCst)
    }

    pub fn profile_upserts(&self) -> usize {
        self.profile_upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchoolDirectory for MockDirectory {
    async fn create_school(
        &self,
        name: &str,
        address: Option<&str>,
        unhcr_status: bool,
    ) -> PortResult<School> {
        if let Some(message) = self.fail_create_school.lock().unwrap().clone() {
            return Err(PortError::Unexpected(message));
        }
        self.created_schools.fetch_add(1, Ordering::SeqCst);
        Ok(School {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: address.map(str::to_string),
            unhcr_status,
            logo_url: None,
        })
    }

    async fn update_school_logo(&self, school_id: Uuid, logo_url: &str) -> PortResult<School> {
        self.logo_patches.fetch_add(1, Ordering::SeqCst);
        Ok(School {
            id: school_id,
            name: "Test School".to_string(),
            address: None,
            unhcr_status: false,
            logo_url: Some(logo_url.to_string()),
        })
    }

    async fn get_school(&self, school_id: Uuid) -> PortResult<School> {
        Ok(School {
            id: school_id,
            name: "Test School".to_string(),
            address: None,
            unhcr_status: false,
            logo_url: None,
        })
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        school_id: Uuid,
        role: &str,
        full_name: &str,
    ) -> PortResult<Profile> {
        if let Some(message) = self.fail_profile_upsert.lock().unwrap().clone() {
            return Err(PortError::Unexpected(message));
        }
        self.profile_upserts.fetch_add(1, Ordering::SeqCst);
        Ok(Profile {
            id: user_id,
            school_id: Some(school_id),
            role: role.to_string(),
            full_name: full_name.to_string(),
        })
    }

    async fn fetch_profile(&self, _user_id: Uuid) -> PortResult<Option<Profile>> {
        Ok(None)
    }
}

#[derive(Default)]
pub struct MockAssets {
    stored: AtomicUsize,
    fail_store: Mutex<Option<String>>,
}

impl MockAssets {
    pub fn fail_store(&self, message: &str) {
        *self.fail_store.lock().unwrap() = Some(message.to_string());
    }

    pub fn stored(&self) -> usize {
        self.stored.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for MockAssets {
    async fn store(&self, _path: &str, _bytes: &[u8], _content_type: &str) -> PortResult<()> {
        if let Some(message) = self.fail_store.lock().unwrap().clone() {
            return Err(PortError::Unexpected(message));
        }
        self.stored.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("http://assets.test/{path}")
    }
}

#[derive(Default)]
pub struct MockInvitations {
    batches: AtomicUsize,
    fail_send: Mutex<Option<String>>,
}

impl MockInvitations {
    pub fn fail_send(&self, message: &str) {
        *self.fail_send.lock().unwrap() = Some(message.to_string());
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvitationSender for MockInvitations {
    async fn send(
        &self,
        _school_id: Uuid,
        _school_name: &str,
        emails: &[String],
    ) -> PortResult<Vec<Invitation>> {
        if let Some(message) = self.fail_send.lock().unwrap().clone() {
            return Err(PortError::Unexpected(message));
        }
        self.batches.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        Ok(emails
            .iter()
            .map(|email| Invitation {
                email: email.clone(),
                status: "pending".to_string(),
                sent_at: now,
            })
            .collect())
    }
}

/// Records adopted commit results for assertions.
#[derive(Default)]
pub struct RecordingSchoolSession {
    adopted: Mutex<Vec<CommitResult>>,
}

impl RecordingSchoolSession {
    pub fn adopted_count(&self) -> usize {
        self.adopted.lock().unwrap().len()
    }

    pub fn last_school_name(&self) -> Option<String> {
        self.adopted
            .lock()
            .unwrap()
            .last()
            .map(|r| r.school.name.clone())
    }
}

impl SchoolSession for RecordingSchoolSession {
    fn adopt(&self, result: &CommitResult) {
        self.adopted.lock().unwrap().push(result.clone());
    }
}
