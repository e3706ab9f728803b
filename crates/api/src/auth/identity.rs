//! Bearer-token verification for the external identity provider.
//!
//! The provider issues HS256-signed tokens carrying an [`IdentityClaims`]
//! payload. This backend never issues tokens itself; it only verifies them
//! and remembers which ones were logged out. Revoked tokens are tracked by
//! SHA-256 digest until they would have expired anyway.

use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use resonant_core::error::CoreError;
use resonant_core::session::{IdentityProvider, IdentityUser};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

/// Hosted login UI used when `IDENTITY_LOGIN_URL` is unset.
pub const DEFAULT_LOGIN_URL: &str = "https://auth.privy.io";

/// Claims carried by identity-provider tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Provider-assigned user id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// The provider app id the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Configuration for identity token verification.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Shared HMAC secret. The provider reports not-ready while unset.
    pub jwt_secret: Option<String>,
    /// Expected `aud` claim; audience is not checked when unset.
    pub app_id: Option<String>,
    /// Hosted login UI shown to signed-out visitors.
    pub login_url: String,
}

impl IdentityConfig {
    /// Load identity configuration from environment variables.
    ///
    /// | Env Var               | Required | Default                 |
    /// |-----------------------|----------|-------------------------|
    /// | `IDENTITY_JWT_SECRET` | no       | unset (gate not ready)  |
    /// | `IDENTITY_APP_ID`     | no       | unset (no `aud` check)  |
    /// | `IDENTITY_LOGIN_URL`  | no       | `https://auth.privy.io` |
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            jwt_secret: non_empty("IDENTITY_JWT_SECRET"),
            app_id: non_empty("IDENTITY_APP_ID"),
            login_url: non_empty("IDENTITY_LOGIN_URL")
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
        }
    }
}

/// [`IdentityProvider`] backed by locally verified HS256 tokens.
pub struct JwtIdentityProvider {
    login_url: String,
    decoding_key: Option<DecodingKey>,
    validation: Validation,
    /// Token digest -> token expiry.
    revoked: RwLock<HashMap<String, i64>>,
}

impl JwtIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.app_id {
            Some(app_id) => validation.set_audience(&[app_id]),
            None => validation.validate_aud = false,
        }

        Self {
            login_url: config.login_url.clone(),
            decoding_key: config
                .jwt_secret
                .as_deref()
                .map(|s| DecodingKey::from_secret(s.as_bytes())),
            validation,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    fn verify(&self, token: &str) -> Result<Option<IdentityClaims>, CoreError> {
        let key = self.decoding_key.as_ref().ok_or_else(not_ready)?;
        match decode::<IdentityClaims>(token, key, &self.validation) {
            Ok(data) => Ok(Some(data.claims)),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected identity token");
                Ok(None)
            }
        }
    }

    /// Number of tokens currently on the revocation list.
    pub async fn revoked_count(&self) -> usize {
        self.revoked.read().await.len()
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    fn is_ready(&self) -> bool {
        self.decoding_key.is_some()
    }

    fn login_url(&self) -> &str {
        &self.login_url
    }

    async fn resolve(&self, token: &str) -> Result<Option<IdentityUser>, CoreError> {
        let Some(claims) = self.verify(token)? else {
            return Ok(None);
        };
        if self.revoked.read().await.contains_key(&token_digest(token)) {
            return Ok(None);
        }

        Ok(Some(IdentityUser {
            id: claims.sub,
            email: claims.email,
            wallet_address: claims.wallet_address,
        }))
    }

    async fn logout(&self, token: &str) -> Result<(), CoreError> {
        // An invalid token has no session to end.
        let Some(claims) = self.verify(token)? else {
            return Ok(());
        };

        let now = chrono::Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(token_digest(token), claims.exp);
        tracing::info!(user_id = %claims.sub, "Identity session ended");
        Ok(())
    }
}

fn not_ready() -> CoreError {
    CoreError::Unavailable("Identity provider is not configured".into())
}

/// SHA-256 hex digest of a bearer token.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
