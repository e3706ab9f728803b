//! Voice-talent application sessions and the submission pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use resonant_core::error::CoreError;
use resonant_core::ingest::SampleIngestor;
use resonant_core::onboarding::{OnboardingWizard, Sample, SubmissionOutcome};
use resonant_core::types::{DbId, Timestamp};
use resonant_db::models::account::AccountChanges;
use resonant_db::repositories::AccountStore;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Warning recorded when a sample was stored but the caller has no account.
pub const NO_LINKED_ACCOUNT_WARNING: &str = "No account is linked to this identity";

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Ingest the sample, then attach the resulting content id to the account.
///
/// Never fails: every error is folded into the returned outcome. The update
/// is only attempted after ingestion succeeded with a content id.
pub async fn run_submission(
    sample: &Sample,
    ingestor: &dyn SampleIngestor,
    accounts: &dyn AccountStore,
    account_id: Option<DbId>,
) -> SubmissionOutcome {
    let receipt = match ingestor.submit(sample).await {
        Ok(receipt) => receipt,
        Err(e) => {
            tracing::warn!(error = %e, account_id, "Voice sample ingestion failed");
            return SubmissionOutcome {
                ingestion_error: Some(e.to_string()),
                ..Default::default()
            };
        }
    };

    let mut outcome = SubmissionOutcome {
        ingestion_payload: Some(receipt.payload),
        ..Default::default()
    };

    let Some(content_id) = receipt.content_id else {
        tracing::warn!(account_id, "Ingestion response carried no content id");
        return outcome;
    };

    match account_id {
        Some(id) => {
            let changes = AccountChanges::voice_talent(content_id.as_str());
            match accounts.update(id, &changes).await {
                Ok(()) => {
                    tracing::info!(account_id = id, %content_id, "Voice sample attached to account");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        account_id = id,
                        %content_id,
                        "Voice sample stored but account update failed"
                    );
                    outcome.persistence_warning = Some(e.to_string());
                }
            }
        }
        None => {
            tracing::warn!(%content_id, "Voice sample stored for an identity without an account");
            outcome.persistence_warning = Some(NO_LINKED_ACCOUNT_WARNING.to_string());
        }
    }

    outcome
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// How often the background sweep looks for expired applications.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One applicant's wizard, bound to the identity that created it.
#[derive(Debug)]
pub struct Application {
    pub id: Uuid,
    /// Identity-provider user id of the applicant.
    pub owner: String,
    pub created_at: Timestamp,
    pub wizard: OnboardingWizard,
}

/// Bounds on what the registry keeps in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Applications older than this are discarded, finished or not.
    pub ttl: Duration,
    /// Applications one identity may hold at once.
    pub max_per_owner: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_per_owner: 3,
        }
    }
}

struct Entry {
    owner: String,
    opened: Instant,
    application: Arc<Mutex<Application>>,
}

impl Entry {
    /// A locked application is mid-request and never counts as finished.
    fn is_finished(&self) -> bool {
        self.application
            .try_lock()
            .is_ok_and(|app| app.wizard.state().is_terminal())
    }
}

/// In-memory store of open applications.
///
/// Each application has its own lock; handlers hold it only while mutating
/// the wizard, never across the submission calls. Entries expire
/// [`RegistryLimits::ttl`] after they were opened.
pub struct OnboardingRegistry {
    limits: RegistryLimits,
    applications: RwLock<HashMap<Uuid, Entry>>,
}

impl Default for OnboardingRegistry {
    fn default() -> Self {
        Self::new(RegistryLimits::default())
    }
}

impl OnboardingRegistry {
    pub fn new(limits: RegistryLimits) -> Self {
        Self {
            limits,
            applications: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new application for `owner`.
    ///
    /// At the per-owner limit the owner's finished applications are
    /// released first; if that frees nothing the call is a `Conflict`.
    pub async fn create(
        &self,
        owner: &str,
        wizard: OnboardingWizard,
    ) -> Result<Arc<Mutex<Application>>, CoreError> {
        let mut applications = self.applications.write().await;
        self.expire(&mut applications);

        if owned_by(&applications, owner) >= self.limits.max_per_owner {
            applications.retain(|_, e| e.owner != owner || !e.is_finished());
            if owned_by(&applications, owner) >= self.limits.max_per_owner {
                return Err(CoreError::Conflict(format!(
                    "At most {} applications may be open at once; finish or discard one first",
                    self.limits.max_per_owner
                )));
            }
        }

        let id = Uuid::new_v4();
        let application = Arc::new(Mutex::new(Application {
            id,
            owner: owner.to_string(),
            created_at: chrono::Utc::now(),
            wizard,
        }));
        applications.insert(
            id,
            Entry {
                owner: owner.to_string(),
                opened: Instant::now(),
                application: Arc::clone(&application),
            },
        );
        Ok(application)
    }

    /// Look up an application owned by `owner`. Another owner's application
    /// and an expired one are reported as missing.
    pub async fn get(&self, id: Uuid, owner: &str) -> Result<Arc<Mutex<Application>>, CoreError> {
        let applications = self.applications.read().await;
        match applications.get(&id) {
            Some(entry) if entry.owner == owner && !self.is_expired(entry) => {
                Ok(Arc::clone(&entry.application))
            }
            _ => Err(not_found(id)),
        }
    }

    /// Discard an application owned by `owner`.
    pub async fn remove(&self, id: Uuid, owner: &str) -> Result<(), CoreError> {
        let mut applications = self.applications.write().await;
        match applications.get(&id) {
            Some(entry) if entry.owner == owner => {
                applications.remove(&id);
                Ok(())
            }
            _ => Err(not_found(id)),
        }
    }

    /// Drop every expired application, returning how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let mut applications = self.applications.write().await;
        self.expire(&mut applications)
    }

    pub async fn len(&self) -> usize {
        self.applications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.opened.elapsed() >= self.limits.ttl
    }

    fn expire(&self, applications: &mut HashMap<Uuid, Entry>) -> usize {
        let before = applications.len();
        applications.retain(|_, entry| !self.is_expired(entry));
        before - applications.len()
    }
}

fn owned_by(applications: &HashMap<Uuid, Entry>, owner: &str) -> usize {
    applications.values().filter(|e| e.owner == owner).count()
}

fn not_found(id: Uuid) -> CoreError {
    CoreError::NotFound {
        entity: "Application",
        id: id.to_string(),
    }
}

/// Periodically evict expired applications. Runs until the runtime stops.
pub async fn sweep_expired(registry: Arc<OnboardingRegistry>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let evicted = registry.evict_expired().await;
        if evicted > 0 {
            tracing::debug!(evicted, "Expired voice-talent applications evicted");
        }
    }
}
