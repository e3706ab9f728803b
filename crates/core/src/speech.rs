//! Text-to-speech demo: voice catalog and request validation.
//!
//! Generation itself is simulated by the api crate; nothing here synthesizes
//! audio.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A voice offered by the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub accent: &'static str,
}

pub const VOICES: [Voice; 4] = [
    Voice {
        id: "sarah",
        name: "Sarah",
        description: "Professional & Clear",
        accent: "American English",
    },
    Voice {
        id: "james",
        name: "James",
        description: "Warm & Conversational",
        accent: "British English",
    },
    Voice {
        id: "maria",
        name: "Maria",
        description: "Energetic & Friendly",
        accent: "Spanish English",
    },
    Voice {
        id: "alex",
        name: "Alex",
        description: "Neutral & Versatile",
        accent: "Canadian English",
    },
];

pub const DEFAULT_VOICE_ID: &str = "sarah";

/// Look up a voice by id.
pub fn find_voice(id: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|v| v.id == id)
}

/// Request body for `POST /speech/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSpeechRequest {
    pub text: String,
    pub voice: Option<String>,
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechJob {
    pub text: String,
    pub voice: &'static Voice,
}

/// Trim the text and resolve the voice, defaulting to Sarah.
pub fn prepare_job(req: &GenerateSpeechRequest) -> Result<SpeechJob, CoreError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(CoreError::Validation("Text is required".to_string()));
    }

    let voice_id = req.voice.as_deref().unwrap_or(DEFAULT_VOICE_ID);
    let voice = find_voice(voice_id).ok_or_else(|| {
        CoreError::Validation(format!("Unknown voice '{voice_id}'"))
    })?;

    Ok(SpeechJob {
        text: text.to_string(),
        voice,
    })
}

/// Suggested file name for downloading a generated clip.
pub fn download_name(voice: &Voice, unix_millis: i64) -> String {
    format!("{}-voice-{unix_millis}.mp3", voice.name.to_lowercase())
}
