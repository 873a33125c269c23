//! services/api/src/web/onboarding.rs
//!
//! The onboarding wizard's REST surface: session lifecycle, step data patches,
//! logo upload, teacher invitations, step transitions, and the completion
//! commit. Wizard sessions live in memory and belong to the principal who
//! created them.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use base64::prelude::{Engine, BASE64_STANDARD};
use edusync_core::controller::{ControllerError, OnboardingController};
use edusync_core::domain::{LogoAsset, Principal, StepPatch};
use edusync_core::validate::check_logo_file;
use edusync_core::wizard::TransitionError;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The error payload all wizard endpoints share. `field_errors` is populated
/// only for validation failures.
#[derive(Serialize, ToSchema)]
pub struct WizardError {
    pub error: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

type WizardRejection = (StatusCode, Json<WizardError>);

/// A snapshot of one wizard session for the client.
#[derive(Serialize, ToSchema)]
pub struct WizardView {
    pub session_id: Uuid,
    pub step: u8,
    pub step_label: &'static str,
    /// Shown for steps 1-7; the success screen hides it.
    pub progress_percent: u8,
    pub finished: bool,
    pub busy: bool,
    pub error: Option<String>,
    pub record: RecordView,
}

/// The record's client-visible slice. Logo bytes stay server-side; only the
/// preview data URI travels back.
#[derive(Serialize, ToSchema)]
pub struct RecordView {
    pub school_name: String,
    pub school_address: String,
    pub unhcr_status: Option<bool>,
    pub logo_preview: Option<String>,
    pub principal_name: String,
    pub principal_phone: String,
    pub teacher_emails: Vec<String>,
}

/// A whole-field step data patch, tagged by step.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepDataBody {
    SchoolName {
        school_name: String,
    },
    SchoolAddress {
        school_address: String,
    },
    UnhcrStatus {
        unhcr_status: bool,
    },
    PrincipalInfo {
        principal_name: String,
        #[serde(default)]
        principal_phone: String,
    },
}

#[derive(Deserialize, ToSchema)]
pub struct AddTeacherRequest {
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct OnboardingStatusResponse {
    pub has_completed_onboarding: bool,
    pub school_id: Option<Uuid>,
    pub role: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BackResponse {
    pub moved: bool,
    pub step: u8,
}

/// A successful commit: the full result plus the terminal session snapshot.
#[derive(Serialize, ToSchema)]
pub struct CompleteResponse {
    #[schema(value_type = Object)]
    pub result: edusync_core::domain::CommitResult,
    pub session: WizardView,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn reject(status: StatusCode, message: impl Into<String>) -> WizardRejection {
    (
        status,
        Json(WizardError {
            error: message.into(),
            field_errors: BTreeMap::new(),
        }),
    )
}

fn not_found() -> WizardRejection {
    reject(StatusCode::NOT_FOUND, "Onboarding session not found")
}

/// Maps a controller refusal onto an HTTP status and payload. Validation
/// failures become 422 with field errors; sequencing violations become 409.
fn controller_rejection(err: ControllerError) -> WizardRejection {
    match err {
        ControllerError::Transition(TransitionError::Invalid(validation)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(WizardError {
                error: "Current step input is invalid".to_string(),
                field_errors: validation.field_errors,
            }),
        ),
        ControllerError::Email(e) => reject(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        ControllerError::Commit(message) => reject(StatusCode::UNPROCESSABLE_ENTITY, message),
        ControllerError::Busy => reject(StatusCode::CONFLICT, err.to_string()),
        other => reject(StatusCode::CONFLICT, other.to_string()),
    }
}

fn view(session_id: Uuid, controller: &OnboardingController) -> WizardView {
    let step = controller.current_step();
    let record = controller.session().record();
    WizardView {
        session_id,
        step: step.number(),
        step_label: step.label(),
        progress_percent: controller.progress_percent(),
        finished: controller.session().is_terminal(),
        busy: controller.is_busy(),
        error: controller.last_error().map(str::to_string),
        record: RecordView {
            school_name: record.school_name.clone(),
            school_address: record.school_address.clone(),
            unhcr_status: record.unhcr_status,
            logo_preview: record.logo.as_ref().map(|l| l.preview_data_uri.clone()),
            principal_name: record.principal_name.clone(),
            principal_phone: record.principal_phone.clone(),
            teacher_emails: record.teacher_emails().to_vec(),
        },
    }
}

/// Looks up a wizard session, enforcing that it belongs to the caller.
async fn find_session(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> Result<Arc<Mutex<OnboardingController>>, WizardRejection> {
    // Hold the map guard only for the lookup. Waiting on a busy entry's lock
    // while still holding the map would stall every other session's requests
    // behind one in-flight commit.
    let entry = {
        let wizards = state.wizards.lock().await;
        wizards.get(&id).cloned().ok_or_else(not_found)?
    };
    // Don't leak other principals' sessions; an id you don't own is a 404.
    let owned = entry.lock().await.principal().id == principal.id;
    if !owned {
        return Err(not_found());
    }
    Ok(entry)
}

//=========================================================================================
// Status and Session Lifecycle
//=========================================================================================

/// Check whether the caller has already completed onboarding.
#[utoipa::path(
    get,
    path = "/onboarding/status",
    responses(
        (status = 200, description = "Onboarding status", body = OnboardingStatusResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, WizardRejection> {
    let profile = state
        .directory
        .fetch_profile(principal.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch profile: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch profile")
        })?;

    // A profile with a school attached marks a finished onboarding.
    let school_id = profile.as_ref().and_then(|p| p.school_id);
    Ok(Json(OnboardingStatusResponse {
        has_completed_onboarding: school_id.is_some(),
        school_id,
        role: profile.map(|p| p.role),
    }))
}

/// Create a new wizard session for the authenticated principal.
#[utoipa::path(
    post,
    path = "/onboarding/sessions",
    responses(
        (status = 201, description = "Session created", body = WizardView),
        (status = 409, description = "Already onboarded")
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, WizardRejection> {
    let profile = state
        .directory
        .fetch_profile(principal.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch profile: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch profile")
        })?;
    if profile.and_then(|p| p.school_id).is_some() {
        return Err(reject(
            StatusCode::CONFLICT,
            "This account has already completed onboarding",
        ));
    }

    let session_id = Uuid::new_v4();
    let controller = OnboardingController::new(
        principal.clone(),
        state.committer(),
        state.school_session_for(principal.id),
    );
    let body = view(session_id, &controller);

    let mut wizards = state.wizards.lock().await;
    // One live attempt per principal: starting over drops the old session.
    wizards.retain(|_, entry| match entry.try_lock() {
        Ok(c) => c.principal().id != principal.id,
        Err(_) => true,
    });
    wizards.insert(session_id, Arc::new(Mutex::new(controller)));

    info!(%session_id, user_id = %principal.id, "Onboarding session created");
    Ok((StatusCode::CREATED, Json(body)))
}

/// Get a single wizard session by id.
#[utoipa::path(
    get,
    path = "/onboarding/sessions/{id}",
    responses(
        (status = 200, description = "Session snapshot", body = WizardView),
        (status = 404, description = "No such session")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, WizardRejection> {
    let entry = find_session(&state, &principal, id).await?;
    let controller = entry.lock().await;
    Ok(Json(view(id, &controller)))
}

//=========================================================================================
// Record Mutation
//=========================================================================================

/// Replace the current step's slice of the record.
#[utoipa::path(
    put,
    path = "/onboarding/sessions/{id}/step-data",
    request_body = StepDataBody,
    responses(
        (status = 200, description = "Record updated", body = WizardView),
        (status = 404, description = "No such session"),
        (status = 409, description = "Session is finished or busy")
    )
)]
pub async fn update_step_data(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(body): Json<StepDataBody>,
) -> Result<impl IntoResponse, WizardRejection> {
    let patch = match body {
        StepDataBody::SchoolName { school_name } => StepPatch::SchoolName(school_name),
        StepDataBody::SchoolAddress { school_address } => StepPatch::SchoolAddress(school_address),
        StepDataBody::UnhcrStatus { unhcr_status } => StepPatch::UnhcrStatus(unhcr_status),
        StepDataBody::PrincipalInfo {
            principal_name,
            principal_phone,
        } => StepPatch::PrincipalInfo {
            name: principal_name,
            phone: principal_phone,
        },
    };

    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    controller.patch(patch).map_err(controller_rejection)?;
    Ok(Json(view(id, &controller)))
}

/// Accept a logo file into the record via multipart upload.
#[utoipa::path(
    post,
    path = "/onboarding/sessions/{id}/logo",
    request_body(content_type = "multipart/form-data", description = "The logo image file."),
    responses(
        (status = 200, description = "Logo accepted", body = WizardView),
        (status = 404, description = "No such session"),
        (status = 422, description = "Unsupported type or file too large")
    )
)]
pub async fn upload_logo(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, WizardRejection> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Failed to read multipart data: {e}")))?
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Multipart form must include a file"))?;

    let content_type = field
        .content_type()
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "File part must declare a content type"))?
        .to_string();
    let file_name = field.file_name().unwrap_or("logo").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Failed to read file bytes: {e}")))?;

    // Rejections here block only accepting the file, never step advancement.
    check_logo_file(&content_type, bytes.len())
        .map_err(|e| reject(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let preview_data_uri = format!("data:{};base64,{}", content_type, BASE64_STANDARD.encode(&bytes));
    let asset = LogoAsset {
        bytes: bytes.to_vec(),
        content_type,
        file_name,
        preview_data_uri,
    };

    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    controller
        .patch(StepPatch::Logo(Some(asset)))
        .map_err(controller_rejection)?;
    Ok(Json(view(id, &controller)))
}

/// Remove a previously accepted logo from the record.
#[utoipa::path(
    delete,
    path = "/onboarding/sessions/{id}/logo",
    responses(
        (status = 200, description = "Logo cleared", body = WizardView),
        (status = 404, description = "No such session")
    )
)]
pub async fn remove_logo(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, WizardRejection> {
    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    controller
        .patch(StepPatch::Logo(None))
        .map_err(controller_rejection)?;
    Ok(Json(view(id, &controller)))
}

/// Add a teacher email to the invitation list.
#[utoipa::path(
    post,
    path = "/onboarding/sessions/{id}/teachers",
    request_body = AddTeacherRequest,
    responses(
        (status = 200, description = "Email added", body = WizardView),
        (status = 404, description = "No such session"),
        (status = 422, description = "Empty, malformed, or duplicate email")
    )
)]
pub async fn add_teacher(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddTeacherRequest>,
) -> Result<impl IntoResponse, WizardRejection> {
    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    controller
        .add_teacher_email(&body.email)
        .map_err(controller_rejection)?;
    Ok(Json(view(id, &controller)))
}

/// Remove a teacher email from the invitation list.
#[utoipa::path(
    delete,
    path = "/onboarding/sessions/{id}/teachers/{email}",
    responses(
        (status = 200, description = "Email removed (or was absent)", body = WizardView),
        (status = 404, description = "No such session")
    )
)]
pub async fn remove_teacher(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((id, email)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, WizardRejection> {
    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    controller
        .remove_teacher_email(&email)
        .map_err(controller_rejection)?;
    Ok(Json(view(id, &controller)))
}

//=========================================================================================
// Step Transitions
//=========================================================================================

/// Advance the wizard to the next step.
///
/// Validates the current step's data before allowing advancement.
#[utoipa::path(
    post,
    path = "/onboarding/sessions/{id}/advance",
    responses(
        (status = 200, description = "Advanced", body = WizardView),
        (status = 404, description = "No such session"),
        (status = 409, description = "Advancing is not available from this step"),
        (status = 422, description = "Current step input is invalid", body = WizardError)
    )
)]
pub async fn advance_step(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, WizardRejection> {
    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    let from = controller.current_step().number();
    let to = controller.next().map_err(controller_rejection)?;
    info!(session_id = %id, from_step = from, to_step = to.number(), "Onboarding session advanced");
    Ok(Json(view(id, &controller)))
}

/// Go back one step in the wizard. A no-op on the first and success steps.
#[utoipa::path(
    post,
    path = "/onboarding/sessions/{id}/back",
    responses(
        (status = 200, description = "Result of the back transition", body = BackResponse),
        (status = 404, description = "No such session"),
        (status = 409, description = "A commit is in flight")
    )
)]
pub async fn go_back(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, WizardRejection> {
    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    let moved = controller.back().map_err(controller_rejection)?;
    Ok(Json(BackResponse {
        moved,
        step: controller.current_step().number(),
    }))
}

/// Skip an optional step, force-writing its empty default.
#[utoipa::path(
    post,
    path = "/onboarding/sessions/{id}/skip",
    responses(
        (status = 200, description = "Skipped", body = WizardView),
        (status = 404, description = "No such session"),
        (status = 409, description = "This step cannot be skipped")
    )
)]
pub async fn skip_step(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, WizardRejection> {
    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    let to = controller.skip().map_err(controller_rejection)?;
    info!(session_id = %id, to_step = to.number(), "Onboarding step skipped");
    Ok(Json(view(id, &controller)))
}

//=========================================================================================
// Completion
//=========================================================================================

/// Run the commit sequence from the review step.
///
/// On success the wizard reaches its success step and the created school is
/// adopted into the caller's session. On fatal failure the wizard stays on
/// review with the stage's message, and the caller may retry.
#[utoipa::path(
    post,
    path = "/onboarding/sessions/{id}/complete",
    responses(
        (status = 200, description = "Onboarding committed", body = CompleteResponse),
        (status = 404, description = "No such session"),
        (status = 409, description = "Not at review, already finished, or busy"),
        (status = 422, description = "A fatal commit stage failed", body = WizardError)
    )
)]
pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, WizardRejection> {
    let entry = find_session(&state, &principal, id).await?;
    let mut controller = entry.lock().await;
    match controller.complete().await {
        Ok(result) => {
            info!(
                session_id = %id,
                user_id = %principal.id,
                school_id = %result.school.id,
                invitations = result.invitations.len(),
                "Onboarding completed"
            );
            Ok(Json(CompleteResponse {
                session: view(id, &controller),
                result,
            }))
        }
        Err(err) => {
            error!(session_id = %id, error = %err, "Onboarding commit failed");
            Err(controller_rejection(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testsupport;
    use assert_matches::assert_matches;

    #[test]
    fn step_data_payloads_are_tagged_by_step() {
        let body: StepDataBody =
            serde_json::from_str(r#"{"step":"school_name","school_name":"Hope Academy"}"#)
                .unwrap();
        assert_matches!(body, StepDataBody::SchoolName { school_name } if school_name == "Hope Academy");

        let body: StepDataBody =
            serde_json::from_str(r#"{"step":"unhcr_status","unhcr_status":true}"#).unwrap();
        assert_matches!(body, StepDataBody::UnhcrStatus { unhcr_status: true });
    }

    #[test]
    fn principal_phone_defaults_to_empty() {
        let body: StepDataBody =
            serde_json::from_str(r#"{"step":"principal_info","principal_name":"Amina Yusuf"}"#)
                .unwrap();
        assert_matches!(
            body,
            StepDataBody::PrincipalInfo { principal_phone, .. } if principal_phone.is_empty()
        );
    }

    #[test]
    fn unknown_step_tag_is_rejected() {
        let parsed = serde_json::from_str::<StepDataBody>(r#"{"step":"logo","data":"x"}"#);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn busy_session_does_not_block_other_lookups() {
        let (state, _) = testsupport::test_state();
        let alice = testsupport::principal("alice@school.test");
        let bob = testsupport::principal("bob@school.test");
        let (_, alice_entry) = testsupport::register_session(&state, &alice).await;
        let (bob_id, _) = testsupport::register_session(&state, &bob).await;

        // Park Alice's controller the way an in-flight commit does.
        let _held = alice_entry.lock().await;

        let looked_up = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            find_session(&state, &bob, bob_id),
        )
        .await
        .expect("an unrelated lookup must not wait on a busy session");
        assert!(looked_up.is_ok());
    }

    #[tokio::test]
    async fn foreign_session_lookup_is_a_not_found() {
        let (state, _) = testsupport::test_state();
        let owner = testsupport::principal("owner@school.test");
        let intruder = testsupport::principal("intruder@school.test");
        let (id, _) = testsupport::register_session(&state, &owner).await;

        match find_session(&state, &intruder, id).await {
            Err((status, _)) => assert_eq!(status, StatusCode::NOT_FOUND),
            Ok(_) => panic!("foreign session lookup must not succeed"),
        }
    }
}
