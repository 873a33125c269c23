//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `SchoolDirectory` and `CredentialStore` ports from the `core` crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edusync_core::domain::{AuthSession, Profile, School, UserCredentials};
use edusync_core::ports::{CredentialStore, PortError, PortResult, SchoolDirectory};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the directory and credential ports.
#[derive(Clone)]
pub struct PgAdapter {
    pool: PgPool,
}

impl PgAdapter {
    /// Creates a new `PgAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SchoolRecord {
    id: Uuid,
    name: String,
    address: Option<String>,
    unhcr_status: bool,
    logo_url: Option<String>,
}
impl SchoolRecord {
    fn to_domain(self) -> School {
        School {
            id: self.id,
            name: self.name,
            address: self.address,
            unhcr_status: self.unhcr_status,
            logo_url: self.logo_url,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    school_id: Option<Uuid>,
    role: String,
    full_name: String,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            id: self.id,
            school_id: self.school_id,
            role: self.role,
            full_name: self.full_name,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

//=========================================================================================
// `SchoolDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl SchoolDirectory for PgAdapter {
    async fn create_school(
        &self,
        name: &str,
        address: Option<&str>,
        unhcr_status: bool,
    ) -> PortResult<School> {
        let record = sqlx::query_as::<_, SchoolRecord>(
            "INSERT INTO schools (id, name, address, unhcr_status) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, address, unhcr_status, logo_url",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(address)
        .bind(unhcr_status)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn update_school_logo(&self, school_id: Uuid, logo_url: &str) -> PortResult<School> {
        let record = sqlx::query_as::<_, SchoolRecord>(
            "UPDATE schools SET logo_url = $1 WHERE id = $2 \
             RETURNING id, name, address, unhcr_status, logo_url",
        )
        .bind(logo_url)
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("School {} not found", school_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_school(&self, school_id: Uuid) -> PortResult<School> {
        let record = sqlx::query_as::<_, SchoolRecord>(
            "SELECT id, name, address, unhcr_status, logo_url FROM schools WHERE id = $1",
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("School {} not found", school_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        school_id: Uuid,
        role: &str,
        full_name: &str,
    ) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "INSERT INTO profiles (id, school_id, role, full_name) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET school_id = $2, role = $3, full_name = $4 \
             RETURNING id, school_id, role, full_name",
        )
        .bind(user_id)
        .bind(school_id)
        .bind(role)
        .bind(full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn fetch_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT id, school_id, role, full_name FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ProfileRecord::to_domain))
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for PgAdapter {
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        })
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.map(|(id,)| id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
