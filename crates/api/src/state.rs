use std::sync::Arc;

use resonant_core::ingest::SampleIngestor;
use resonant_core::session::IdentityProvider;
use resonant_db::repositories::AccountStore;

use crate::auth::password::CredentialHasher;
use crate::config::ServerConfig;
use crate::services::onboarding::OnboardingRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every field is behind an `Arc`. The external
/// collaborators are trait objects so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Account persistence (PostgreSQL in production).
    pub accounts: Arc<dyn AccountStore>,
    /// Voice-sample ingestion (blob publisher in production).
    pub ingestor: Arc<dyn SampleIngestor>,
    /// External identity provider behind the session gate.
    pub identity: Arc<dyn IdentityProvider>,
    pub hasher: Arc<CredentialHasher>,
    /// In-progress voice-talent applications.
    pub onboarding: Arc<OnboardingRegistry>,
}
