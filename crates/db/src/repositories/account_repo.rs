//! Repository for the `accounts` table.

use std::time::Duration;

use async_trait::async_trait;
use resonant_core::account::DUPLICATE_EMAIL_MESSAGE;
use resonant_core::error::CoreError;
use resonant_core::types::DbId;
use sqlx::PgPool;

use crate::models::account::{Account, AccountChanges, NewAccount};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, first_name, last_name, account_type, \
                       agree_to_terms, agree_to_marketing, voice_sample_id, created_at, updated_at";

/// Unique index guarding case-insensitive email uniqueness.
pub const EMAIL_UNIQUE_INDEX: &str = "uq_accounts_email_lower";

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Account persistence as seen by the signup, session and onboarding flows.
///
/// Implementations perform no authorization: callers must only pass account
/// ids that belong to the current session.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Case-insensitive existence check. Advisory only; [`Self::create`] is
    /// the authority on uniqueness.
    async fn exists(&self, email: &str) -> Result<bool, CoreError>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError>;

    /// Insert a new account. Fails with [`CoreError::Conflict`] when the
    /// email is already taken.
    async fn create(&self, input: &NewAccount) -> Result<Account, CoreError>;

    /// Apply a partial update. Fails with [`CoreError::NotFound`] when no
    /// account has the given id.
    async fn update(&self, id: DbId, changes: &AccountChanges) -> Result<(), CoreError>;

    /// Confirm the backing store is reachable.
    async fn ping(&self) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// Raw queries
// ---------------------------------------------------------------------------

/// Provides SQL operations for accounts.
pub struct AccountRepo;

impl AccountRepo {
    /// Insert a new account, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewAccount) -> Result<Account, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts
                (email, password_hash, first_name, last_name, account_type,
                 agree_to_terms, agree_to_marketing)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.account_type.as_str())
            .bind(input.agree_to_terms)
            .bind(input.agree_to_marketing)
            .fetch_one(pool)
            .await
    }

    /// Find an account by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an account by email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Whether any account uses this email (case-insensitive).
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// Update an account. Only non-`None` fields in `changes` are applied.
    ///
    /// Returns `false` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &AccountChanges,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET
                voice_sample_id = COALESCE($2, voice_sample_id),
                account_type = COALESCE($3, account_type),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.voice_sample_id)
        .bind(changes.account_type.map(|t| t.as_str()))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL store
// ---------------------------------------------------------------------------

/// [`AccountStore`] backed by PostgreSQL. Every query is bounded by the
/// configured external-call timeout.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgAccountStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, CoreError>
    where
        F: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(classify_sqlx_error),
            Err(_) => {
                tracing::error!(op, timeout_secs = self.timeout.as_secs(), "Account query timed out");
                Err(CoreError::Internal(format!("account {op} timed out")))
            }
        }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn exists(&self, email: &str) -> Result<bool, CoreError> {
        self.bounded("exists", AccountRepo::email_exists(&self.pool, email))
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError> {
        self.bounded("lookup", AccountRepo::find_by_email(&self.pool, email))
            .await
    }

    async fn create(&self, input: &NewAccount) -> Result<Account, CoreError> {
        self.bounded("insert", AccountRepo::create(&self.pool, input))
            .await
    }

    async fn update(&self, id: DbId, changes: &AccountChanges) -> Result<(), CoreError> {
        let updated = self
            .bounded("update", AccountRepo::update(&self.pool, id, changes))
            .await?;
        if !updated {
            return Err(CoreError::NotFound {
                entity: "Account",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CoreError> {
        self.bounded("ping", crate::health_check(&self.pool)).await
    }
}

/// Map a sqlx error onto the domain taxonomy.
///
/// A unique violation on the email index becomes [`CoreError::Conflict`]
/// with the user-facing duplicate message; everything else is internal.
pub fn classify_sqlx_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // PostgreSQL unique constraint violation: error code 23505
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint() == Some(EMAIL_UNIQUE_INDEX)
        {
            return CoreError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string());
        }
    }
    CoreError::Internal(format!("database error: {err}"))
}
