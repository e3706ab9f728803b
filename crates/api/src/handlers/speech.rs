//! Handlers for the `/speech` resource (text-to-speech demo).
//!
//! Generation is simulated: after a fixed delay every request gets the same
//! demo clip back.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use resonant_core::speech::{download_name, prepare_job, GenerateSpeechRequest, Voice, VOICES};
use resonant_core::types::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::session::Session;
use crate::response::DataResponse;
use crate::state::AppState;

/// A finished demo generation.
#[derive(Debug, Serialize)]
pub struct SpeechGeneration {
    pub id: Uuid,
    pub text: String,
    pub voice: &'static str,
    pub voice_name: &'static str,
    pub created_at: Timestamp,
    pub audio_url: String,
    /// Suggested file name for the download button.
    pub download_name: String,
}

/// GET /api/v1/speech/voices
pub async fn list_voices() -> Json<DataResponse<&'static [Voice]>> {
    Json(DataResponse { data: &VOICES })
}

/// POST /api/v1/speech/generate
pub async fn generate(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<GenerateSpeechRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<SpeechGeneration>>> {
    let Json(input) = payload?;
    let job = prepare_job(&input)?;

    tokio::time::sleep(Duration::from_millis(state.config.speech_demo_delay_ms)).await;

    let created_at = Utc::now();
    tracing::debug!(
        user_id = %session.user.id,
        voice = job.voice.id,
        chars = job.text.chars().count(),
        "Speech demo generated"
    );

    Ok(Json(DataResponse {
        data: SpeechGeneration {
            id: Uuid::new_v4(),
            text: job.text,
            voice: job.voice.id,
            voice_name: job.voice.name,
            created_at,
            audio_url: state.config.speech_demo_audio_url.clone(),
            download_name: download_name(job.voice, created_at.timestamp_millis()),
        },
    }))
}
