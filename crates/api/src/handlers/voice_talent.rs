//! Handlers for voice-talent applications (the onboarding wizard).
//!
//! Every route requires a [`Session`]; applications are private to the
//! identity that opened them.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use resonant_core::error::CoreError;
use resonant_core::onboarding::{
    OnboardingWizard, ProfileForm, Progress, Sample, SampleSummary, SubmissionOutcome,
};
use resonant_core::types::{DbId, Timestamp};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::session::Session;
use crate::response::DataResponse;
use crate::services::onboarding::{run_submission, Application};
use crate::state::AppState;

/// Multipart field carrying the uploaded sample.
const SAMPLE_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Client-facing snapshot of an application.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    pub id: Uuid,
    pub state: &'static str,
    pub step: u8,
    pub step_label: &'static str,
    /// Absent once the application was submitted.
    pub progress: Option<Progress>,
    pub recording: bool,
    pub sample: Option<SampleSummary>,
    pub profile: ProfileForm,
    pub outcome: Option<SubmissionOutcome>,
    pub created_at: Timestamp,
}

impl ApplicationView {
    fn of(app: &Application) -> Self {
        let wizard = &app.wizard;
        Self {
            id: app.id,
            state: wizard.state().as_str(),
            step: wizard.state().step_number(),
            step_label: wizard.state().label(),
            progress: wizard.progress(),
            recording: wizard.is_recording(),
            sample: wizard.sample_summary(),
            profile: wizard.profile().clone(),
            outcome: wizard.outcome().cloned(),
            created_at: app.created_at,
        }
    }
}

type ViewResponse = Json<DataResponse<ApplicationView>>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find(state: &AppState, session: &Session, id: Uuid) -> AppResult<Arc<Mutex<Application>>> {
    Ok(state.onboarding.get(id, &session.user.id).await?)
}

/// Apply `step` to the wizard under its lock and answer with the new view.
async fn mutate<F>(state: &AppState, session: &Session, id: Uuid, step: F) -> AppResult<ViewResponse>
where
    F: FnOnce(&mut OnboardingWizard) -> Result<(), CoreError>,
{
    let application = find(state, session, id).await?;
    let mut app = application.lock().await;
    step(&mut app.wizard)?;
    Ok(Json(DataResponse {
        data: ApplicationView::of(&app),
    }))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/voice-talent/applications
pub async fn create_application(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<(StatusCode, ViewResponse)> {
    let application = state
        .onboarding
        .create(
            &session.user.id,
            OnboardingWizard::new(state.config.max_sample_bytes),
        )
        .await?;
    let app = application.lock().await;
    tracing::info!(application_id = %app.id, user_id = %session.user.id, "Application opened");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ApplicationView::of(&app),
        }),
    ))
}

/// GET /api/v1/voice-talent/applications/{id}
pub async fn get_application(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<ViewResponse> {
    let application = find(&state, &session, id).await?;
    let app = application.lock().await;
    Ok(Json(DataResponse {
        data: ApplicationView::of(&app),
    }))
}

/// DELETE /api/v1/voice-talent/applications/{id}
///
/// Exit the wizard, discarding everything captured so far.
pub async fn exit_application(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.onboarding.remove(id, &session.user.id).await?;
    tracing::info!(application_id = %id, "Application discarded");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/voice-talent/applications/{id}/sample
///
/// Multipart upload; the audio goes in the `file` field.
pub async fn upload_sample(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<ViewResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(SAMPLE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("voice-sample").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;

        return mutate(&state, &session, id, |wizard| {
            wizard.attach_upload(file_name, content_type, bytes.to_vec())
        })
        .await;
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{SAMPLE_FIELD}'"
    )))
}

/// POST /api/v1/voice-talent/applications/{id}/recording/start
pub async fn start_recording(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<ViewResponse> {
    mutate(&state, &session, id, OnboardingWizard::start_recording).await
}

/// PUT /api/v1/voice-talent/applications/{id}/recording
///
/// Finish the recording; the raw body is the captured audio.
pub async fn finish_recording(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> AppResult<ViewResponse> {
    mutate(&state, &session, id, |wizard| {
        wizard.finish_recording(body.to_vec())
    })
    .await
}

/// PUT /api/v1/voice-talent/applications/{id}/profile
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    payload: Result<Json<ProfileForm>, JsonRejection>,
) -> AppResult<ViewResponse> {
    let Json(profile) = payload?;
    mutate(&state, &session, id, |wizard| wizard.update_profile(profile)).await
}

/// POST /api/v1/voice-talent/applications/{id}/advance
pub async fn advance(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<ViewResponse> {
    mutate(&state, &session, id, OnboardingWizard::advance).await
}

/// POST /api/v1/voice-talent/applications/{id}/back
pub async fn go_back(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<ViewResponse> {
    mutate(&state, &session, id, OnboardingWizard::go_back).await
}

/// POST /api/v1/voice-talent/applications/{id}/submit
///
/// Ingest the sample and attach it to the caller's account. Always answers
/// 200 with the terminal view; failures are reported in `outcome`. A second
/// submit while one is running is rejected with 409.
///
/// The submission runs on its own task, so the application still reaches
/// `done` when this request is dropped (client gone, request timeout).
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<ViewResponse> {
    let application = find(&state, &session, id).await?;

    let sample = application.lock().await.wizard.begin_submission()?;

    let task = tokio::spawn(complete_submission(
        application,
        sample,
        state,
        session.account_id,
    ));
    let view = task
        .await
        .map_err(|e| AppError::InternalError(format!("Submission task failed: {e}")))??;

    Ok(Json(DataResponse { data: view }))
}

async fn complete_submission(
    application: Arc<Mutex<Application>>,
    sample: Sample,
    state: AppState,
    account_id: Option<DbId>,
) -> Result<ApplicationView, CoreError> {
    let outcome = run_submission(
        &sample,
        state.ingestor.as_ref(),
        state.accounts.as_ref(),
        account_id,
    )
    .await;
    drop(sample);

    let mut app = application.lock().await;
    app.wizard.complete_submission(outcome)?;
    tracing::info!(
        application_id = %app.id,
        account_id,
        succeeded = app.wizard.outcome().is_some_and(|o| o.succeeded()),
        "Application submitted"
    );
    Ok(ApplicationView::of(&app))
}
