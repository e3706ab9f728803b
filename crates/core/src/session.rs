//! Session gate in front of the application shell.
//!
//! The identity provider is external; this module only consumes what it
//! reports (`ready`, `authenticated`, `user`) and decides what the caller is
//! allowed to see.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Display name used when the provider reports neither email nor wallet.
pub const FALLBACK_DISPLAY_IDENTITY: &str = "User";

/// A user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    /// Provider-assigned subject identifier.
    pub id: String,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
}

impl IdentityUser {
    /// Email if present, else wallet address, else a generic label.
    pub fn display_identity(&self) -> &str {
        non_blank(self.email.as_deref())
            .or_else(|| non_blank(self.wallet_address.as_deref()))
            .unwrap_or(FALLBACK_DISPLAY_IDENTITY)
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Provider state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySnapshot {
    pub ready: bool,
    pub authenticated: bool,
    pub user: Option<IdentityUser>,
}

/// What the gate lets through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateView {
    /// Provider still initialising; nothing else may render.
    Loading,
    /// Provider ready but no session; only the sign-in affordance.
    SignIn { login_url: String },
    /// Signed in; the app shell with the user's display identity.
    AppShell {
        user_id: String,
        display_identity: String,
    },
}

/// Decide the gate view for a provider snapshot.
pub fn evaluate_gate(snapshot: &IdentitySnapshot, login_url: &str) -> GateView {
    if !snapshot.ready {
        return GateView::Loading;
    }
    match (&snapshot.user, snapshot.authenticated) {
        (Some(user), true) => GateView::AppShell {
            user_id: user.id.clone(),
            display_identity: user.display_identity().to_string(),
        },
        _ => GateView::SignIn {
            login_url: login_url.to_string(),
        },
    }
}

/// Capabilities the external identity provider offers the backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the provider can authenticate callers yet.
    fn is_ready(&self) -> bool;

    /// Where the hosted login UI lives.
    fn login_url(&self) -> &str;

    /// Resolve a bearer token to a user. `Ok(None)` means the token is not
    /// valid (expired, forged, revoked).
    async fn resolve(&self, token: &str) -> Result<Option<IdentityUser>, CoreError>;

    /// End the session the token belongs to.
    async fn logout(&self, token: &str) -> Result<(), CoreError>;

    /// Snapshot the provider state for an optional bearer token.
    async fn snapshot(&self, token: Option<&str>) -> Result<IdentitySnapshot, CoreError> {
        if !self.is_ready() {
            return Ok(IdentitySnapshot {
                ready: false,
                authenticated: false,
                user: None,
            });
        }
        let user = match token {
            Some(t) => self.resolve(t).await?,
            None => None,
        };
        Ok(IdentitySnapshot {
            ready: true,
            authenticated: user.is_some(),
            user,
        })
    }
}
