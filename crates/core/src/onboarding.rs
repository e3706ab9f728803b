//! Voice-talent onboarding wizard.
//!
//! A linear state machine: `CollectSample -> CollectProfile -> Review ->
//! Done`, with an in-flight `Submitting` state between review and done.
//! Every operation is a guarded transition: a rejected call returns
//! [`CoreError::Validation`] and leaves the wizard untouched. The wizard
//! performs no I/O; the api crate runs the submission calls between
//! [`OnboardingWizard::begin_submission`] and
//! [`OnboardingWizard::complete_submission`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of user-facing steps before the terminal confirmation.
pub const TOTAL_STEPS: u8 = 3;

/// Upload size limit used when no other limit is configured (10 MiB).
pub const DEFAULT_MAX_SAMPLE_BYTES: usize = 10 * 1024 * 1024;

/// Content type assigned to browser recordings.
pub const RECORDING_CONTENT_TYPE: &str = "audio/wav";

/// File name assigned to browser recordings.
pub const RECORDING_FILE_NAME: &str = "voice-sample.wav";

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// A captured voice sample. Uploading and recording both write here; the
/// most recent acquisition replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sample {
    Uploaded {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
    Recorded {
        bytes: Vec<u8>,
    },
}

/// How a sample was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSource {
    Upload,
    Recording,
}

/// Sample metadata for display; never carries the audio itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSummary {
    pub source: SampleSource,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
}

impl Sample {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Uploaded { bytes, .. } | Self::Recorded { bytes } => bytes,
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            Self::Uploaded { content_type, .. } => content_type,
            Self::Recorded { .. } => RECORDING_CONTENT_TYPE,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Uploaded { file_name, .. } => file_name,
            Self::Recorded { .. } => RECORDING_FILE_NAME,
        }
    }

    pub fn source(&self) -> SampleSource {
        match self {
            Self::Uploaded { .. } => SampleSource::Upload,
            Self::Recorded { .. } => SampleSource::Recording,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    pub fn summary(&self) -> SampleSummary {
        SampleSummary {
            source: self.source(),
            file_name: self.file_name().to_string(),
            content_type: self.content_type().to_string(),
            size_bytes: self.bytes().len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile and outcome
// ---------------------------------------------------------------------------

/// Applicant profile. Only `name` and `email` are mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub experience: String,
    pub voice_type: String,
    pub languages: String,
}

impl ProfileForm {
    fn missing_required(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.email.trim().is_empty() {
            Some("email")
        } else {
            None
        }
    }
}

/// What happened when the application was submitted.
///
/// The three fields come from two independent fallible calls, so any
/// combination may be present at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionOutcome {
    /// Raw response from the ingestion endpoint.
    pub ingestion_payload: Option<serde_json::Value>,
    /// The ingestion call failed; no account update was attempted.
    pub ingestion_error: Option<String>,
    /// Ingestion succeeded but attaching the result to the account did not.
    pub persistence_warning: Option<String>,
}

impl SubmissionOutcome {
    /// Whether the application reached the external store.
    pub fn succeeded(&self) -> bool {
        self.ingestion_error.is_none()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    CollectSample,
    CollectProfile,
    Review,
    Submitting,
    Done(SubmissionOutcome),
}

impl WizardState {
    /// 1-based step number. `Submitting` is still shown as the review step.
    pub fn step_number(&self) -> u8 {
        match self {
            Self::CollectSample => 1,
            Self::CollectProfile => 2,
            Self::Review | Self::Submitting => 3,
            Self::Done(_) => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CollectSample => "collect_sample",
            Self::CollectProfile => "collect_profile",
            Self::Review => "review",
            Self::Submitting => "submitting",
            Self::Done(_) => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CollectSample => "Upload Your Voice Sample",
            Self::CollectProfile => "Complete Your Profile",
            Self::Review | Self::Submitting => "Review & Submit",
            Self::Done(_) => "Application Submitted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Progress indicator for the non-terminal steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub step: u8,
    pub total: u8,
    pub percent: u8,
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OnboardingWizard {
    state: WizardState,
    sample: Option<Sample>,
    /// What was submitted; the audio itself is released once done.
    submitted: Option<SampleSummary>,
    recording: bool,
    profile: ProfileForm,
    max_sample_bytes: usize,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLE_BYTES)
    }
}

impl OnboardingWizard {
    pub fn new(max_sample_bytes: usize) -> Self {
        Self {
            state: WizardState::CollectSample,
            sample: None,
            submitted: None,
            recording: false,
            profile: ProfileForm::default(),
            max_sample_bytes,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// The captured audio. Always `None` once the wizard is done.
    pub fn sample(&self) -> Option<&Sample> {
        self.sample.as_ref()
    }

    /// Metadata of the captured sample, still available after submission.
    pub fn sample_summary(&self) -> Option<SampleSummary> {
        self.sample
            .as_ref()
            .map(Sample::summary)
            .or_else(|| self.submitted.clone())
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn profile(&self) -> &ProfileForm {
        &self.profile
    }

    /// The submission outcome once the wizard is done.
    pub fn outcome(&self) -> Option<&SubmissionOutcome> {
        match &self.state {
            WizardState::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// `None` once the wizard reached its terminal step.
    pub fn progress(&self) -> Option<Progress> {
        if self.state.is_terminal() {
            return None;
        }
        let step = self.state.step_number();
        let percent = ((step as u32 * 100 + TOTAL_STEPS as u32 / 2) / TOTAL_STEPS as u32) as u8;
        Some(Progress {
            step,
            total: TOTAL_STEPS,
            percent,
        })
    }

    // -- step 1 ------------------------------------------------------------

    /// Store an uploaded audio file, replacing any earlier sample and
    /// abandoning a recording in progress.
    pub fn attach_upload(
        &mut self,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), CoreError> {
        self.require(WizardState::CollectSample, "upload a sample")?;

        let content_type = content_type.into();
        if !content_type.starts_with("audio/") {
            return Err(CoreError::Validation(format!(
                "Voice samples must be audio files, got '{content_type}'"
            )));
        }
        self.check_payload(&bytes)?;

        self.recording = false;
        self.sample = Some(Sample::Uploaded {
            file_name: file_name.into(),
            content_type,
            bytes,
        });
        Ok(())
    }

    /// Begin a live recording. Any captured sample is discarded.
    pub fn start_recording(&mut self) -> Result<(), CoreError> {
        self.require(WizardState::CollectSample, "start recording")?;
        self.sample = None;
        self.recording = true;
        Ok(())
    }

    /// Stop the live recording and keep its audio as the sample.
    pub fn finish_recording(&mut self, bytes: Vec<u8>) -> Result<(), CoreError> {
        self.require(WizardState::CollectSample, "finish recording")?;
        if !self.recording {
            return Err(CoreError::Validation(
                "No recording is in progress".to_string(),
            ));
        }
        self.check_payload(&bytes)?;

        self.recording = false;
        self.sample = Some(Sample::Recorded { bytes });
        Ok(())
    }

    // -- step 2 ------------------------------------------------------------

    pub fn update_profile(&mut self, profile: ProfileForm) -> Result<(), CoreError> {
        self.require(WizardState::CollectProfile, "edit the profile")?;
        self.profile = profile;
        Ok(())
    }

    // -- navigation --------------------------------------------------------

    /// Move one step forward, enforcing the current step's gate.
    pub fn advance(&mut self) -> Result<(), CoreError> {
        let next = match &self.state {
            WizardState::CollectSample => {
                self.gate_sample()?;
                WizardState::CollectProfile
            }
            WizardState::CollectProfile => {
                self.gate_profile()?;
                WizardState::Review
            }
            WizardState::Review => {
                return Err(CoreError::Validation(
                    "Submit the application to continue".to_string(),
                ))
            }
            WizardState::Submitting => return Err(in_flight()),
            WizardState::Done(_) => return Err(already_submitted()),
        };
        self.state = next;
        Ok(())
    }

    /// Move one step back. Sample and profile are kept.
    pub fn go_back(&mut self) -> Result<(), CoreError> {
        let prev = match &self.state {
            WizardState::CollectSample => {
                return Err(CoreError::Validation(
                    "Already on the first step; cannot go back".to_string(),
                ))
            }
            WizardState::CollectProfile => WizardState::CollectSample,
            WizardState::Review => WizardState::CollectProfile,
            WizardState::Submitting => return Err(in_flight()),
            WizardState::Done(_) => return Err(already_submitted()),
        };
        self.state = prev;
        Ok(())
    }

    // -- submission --------------------------------------------------------

    /// Enter the in-flight state and hand out the sample to submit.
    ///
    /// Rejected with [`CoreError::Conflict`] while a submission is already
    /// running.
    pub fn begin_submission(&mut self) -> Result<Sample, CoreError> {
        match &self.state {
            WizardState::Review => {}
            WizardState::Submitting => return Err(in_flight()),
            WizardState::Done(_) => return Err(already_submitted()),
            _ => {
                return Err(CoreError::Validation(
                    "Review your application before submitting".to_string(),
                ))
            }
        }
        self.gate_sample()?;
        let sample = self
            .sample
            .clone()
            .ok_or_else(|| CoreError::Internal("review reached without a sample".into()))?;
        self.state = WizardState::Submitting;
        Ok(sample)
    }

    /// Record the outcome and move to the terminal step, whatever the
    /// outcome says. The sample's audio is dropped; its summary stays.
    pub fn complete_submission(&mut self, outcome: SubmissionOutcome) -> Result<(), CoreError> {
        if self.state != WizardState::Submitting {
            return Err(CoreError::Validation(
                "No submission is in progress".to_string(),
            ));
        }
        self.submitted = self.sample.take().map(|s| s.summary());
        self.state = WizardState::Done(outcome);
        Ok(())
    }

    // -- guards ------------------------------------------------------------

    fn require(&self, expected: WizardState, action: &str) -> Result<(), CoreError> {
        if self.state == expected {
            return Ok(());
        }
        match &self.state {
            WizardState::Submitting => Err(in_flight()),
            WizardState::Done(_) => Err(already_submitted()),
            other => Err(CoreError::Validation(format!(
                "Cannot {action} during step {} ({})",
                other.step_number(),
                other.label()
            ))),
        }
    }

    fn check_payload(&self, bytes: &[u8]) -> Result<(), CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::Validation(
                "Voice sample is empty".to_string(),
            ));
        }
        if bytes.len() > self.max_sample_bytes {
            return Err(CoreError::Validation(format!(
                "Voice sample exceeds the {} byte limit",
                self.max_sample_bytes
            )));
        }
        Ok(())
    }

    fn gate_sample(&self) -> Result<(), CoreError> {
        match &self.sample {
            Some(sample) if !sample.is_empty() => Ok(()),
            _ => Err(CoreError::Validation(
                "Upload or record a voice sample before continuing".to_string(),
            )),
        }
    }

    fn gate_profile(&self) -> Result<(), CoreError> {
        match self.profile.missing_required() {
            None => Ok(()),
            Some(field) => Err(CoreError::Validation(format!(
                "Profile field '{field}' is required"
            ))),
        }
    }
}

fn in_flight() -> CoreError {
    CoreError::Conflict("A submission is already in progress".to_string())
}

fn already_submitted() -> CoreError {
    CoreError::Validation("The application has already been submitted".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
