//! services/api/src/web/dashboard.rs
//!
//! Read-only endpoints the dashboard needs after onboarding, plus the master
//! definition for the OpenAPI specification.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use edusync_core::domain::Principal;
use edusync_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::auth;
use crate::web::onboarding;
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        onboarding::status_handler,
        onboarding::create_session,
        onboarding::get_session,
        onboarding::update_step_data,
        onboarding::upload_logo,
        onboarding::remove_logo,
        onboarding::add_teacher,
        onboarding::remove_teacher,
        onboarding::advance_step,
        onboarding::go_back,
        onboarding::skip_step,
        onboarding::complete_session,
        me_handler,
        get_school_handler,
    ),
    components(schemas(
        auth::SignupRequest,
        auth::LoginRequest,
        auth::AuthResponse,
        onboarding::WizardError,
        onboarding::WizardView,
        onboarding::RecordView,
        onboarding::StepDataBody,
        onboarding::AddTeacherRequest,
        onboarding::OnboardingStatusResponse,
        onboarding::BackResponse,
        onboarding::CompleteResponse,
        MeResponse,
        SchoolResponse,
    )),
    tags(
        (name = "EduSync API", description = "Authentication, onboarding wizard, and school dashboard endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

/// The signed-in user, their profile (if onboarded), and their active school.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SchoolResponse {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub unhcr_status: bool,
    pub logo_url: Option<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Return the caller's identity and profile.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The signed-in user", body = MeResponse),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MeResponse>, (StatusCode, String)> {
    let profile = state
        .directory
        .fetch_profile(principal.id)
        .await
        .map_err(|e| {
            error!(user_id = %principal.id, error = %e, "Failed to load profile");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load profile".to_string(),
            )
        })?;

    // A school adopted by a just-finished commit counts even if the profile
    // read lags behind.
    let school_id = profile
        .as_ref()
        .and_then(|p| p.school_id)
        .or_else(|| state.schools.get(principal.id).map(|s| s.id));

    Ok(Json(MeResponse {
        user_id: principal.id,
        email: principal.email,
        full_name: profile.as_ref().map(|p| p.full_name.clone()),
        role: profile.map(|p| p.role),
        school_id,
    }))
}

/// Fetch the caller's school by id.
///
/// Scoped: a principal only ever sees their own school, so any other id
/// reads as absent.
#[utoipa::path(
    get,
    path = "/schools/{id}",
    params(("id" = Uuid, Path, description = "The school's unique ID.")),
    responses(
        (status = 200, description = "The school", body = SchoolResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such school, or not the caller's school"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_school_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolResponse>, (StatusCode, String)> {
    let profile = state
        .directory
        .fetch_profile(principal.id)
        .await
        .map_err(|e| {
            error!(user_id = %principal.id, error = %e, "Failed to load profile");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load profile".to_string(),
            )
        })?;
    let owns = profile.and_then(|p| p.school_id) == Some(id)
        || state.schools.get(principal.id).map(|s| s.id) == Some(id);
    if !owns {
        return Err((StatusCode::NOT_FOUND, "School not found".to_string()));
    }

    let school = state.directory.get_school(id).await.map_err(|e| match e {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, "School not found".to_string()),
        other => {
            error!(school_id = %id, error = %other, "Failed to load school");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load school".to_string(),
            )
        }
    })?;

    Ok(Json(SchoolResponse {
        id: school.id,
        name: school.name,
        address: school.address,
        unhcr_status: school.unhcr_status,
        logo_url: school.logo_url,
    }))
}
