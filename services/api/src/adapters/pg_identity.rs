//! services/api/src/adapters/pg_identity.rs
//!
//! An `IdentityProvider` backed by PostgreSQL. Accounts live in `users`; the
//! provider session of this client shell lives in `auth_sessions`, keyed by the
//! configured client id, and is restored at startup.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use go_tany_core::domain::Identity;
use go_tany_core::errors::codes;
use go_tany_core::ports::{
    IdentityChanges, IdentityError, IdentityProvider, IdentityResult,
};
use sqlx::{FromRow, PgPool};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::identity::{
    check_credentials, hash_password, normalize_email, verify_password, AttemptTracker,
    ConsentBroker, IdentityFeed,
};

const USER_COLUMNS: &str = "uid, email, password_hash, display_name, phone_number, photo_url";

#[derive(FromRow)]
struct UserRow {
    uid: Uuid,
    email: String,
    password_hash: Option<String>,
    display_name: Option<String>,
    phone_number: Option<String>,
    photo_url: Option<String>,
}
impl UserRow {
    fn to_domain(self) -> Identity {
        Identity {
            uid: self.uid,
            email: Some(self.email),
            display_name: self.display_name,
            phone_number: self.phone_number,
            photo_url: self.photo_url,
        }
    }
}

fn db_error(e: sqlx::Error) -> IdentityError {
    error!("Identity database error: {:?}", e);
    IdentityError::new(codes::NETWORK_REQUEST_FAILED, e.to_string())
}

pub struct PgIdentityProvider {
    pool: PgPool,
    client_id: String,
    session_ttl: Duration,
    feed: IdentityFeed,
    consent: Arc<ConsentBroker>,
    attempts: AttemptTracker,
}

impl PgIdentityProvider {
    /// The feed stays silent until [`Self::restore`] has run.
    pub fn new(
        pool: PgPool,
        client_id: impl Into<String>,
        session_ttl_days: i64,
        consent: Arc<ConsentBroker>,
    ) -> Self {
        Self {
            pool,
            client_id: client_id.into(),
            session_ttl: Duration::days(session_ttl_days),
            feed: IdentityFeed::restoring(),
            consent,
            attempts: AttemptTracker::default(),
        }
    }

    /// Loads the persisted session, if one exists and has not expired, and
    /// publishes the result as the first change notification.
    pub async fn restore(&self) {
        let restored = self.load_session().await.unwrap_or_else(|e| {
            warn!("Could not restore provider session: {}", e);
            None
        });
        match &restored {
            Some(identity) => info!(uid = %identity.uid, "Provider session restored."),
            None => info!("No provider session to restore."),
        }
        self.feed.set(restored);
    }

    async fn load_session(&self) -> Result<Option<Identity>, sqlx::Error> {
        sqlx::query("DELETE FROM auth_sessions WHERE client_id = $1 AND expires_at <= NOW()")
            .bind(&self.client_id)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query_as::<_, UserRow>(
            "SELECT u.uid, u.email, u.password_hash, u.display_name, u.phone_number, u.photo_url \
             FROM auth_sessions s JOIN users u ON u.uid = s.uid \
             WHERE s.client_id = $1 AND s.expires_at > NOW()",
        )
        .bind(&self.client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::to_domain))
    }

    async fn start_session(&self, identity: Identity) -> IdentityResult<Identity> {
        let expires_at = Utc::now() + self.session_ttl;
        sqlx::query(
            "INSERT INTO auth_sessions (client_id, uid, expires_at) VALUES ($1, $2, $3) \
             ON CONFLICT (client_id) DO UPDATE SET uid = EXCLUDED.uid, \
                expires_at = EXCLUDED.expires_at, created_at = NOW()",
        )
        .bind(&self.client_id)
        .bind(identity.uid)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        info!(uid = %identity.uid, "Provider session started.");
        self.feed.set(Some(identity.clone()));
        Ok(identity)
    }

    async fn user_by_email(&self, email: &str) -> IdentityResult<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> IdentityResult<Identity> {
        check_credentials(email, password)?;
        let email = normalize_email(email);
        let password_hash = hash_password(password)?;

        let created = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (uid, email, password_hash) VALUES ($1, $2, $3) \
             ON CONFLICT (email) DO NOTHING RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match created {
            Some(row) => self.start_session(row.to_domain()).await,
            None => Err(IdentityError::new(
                codes::EMAIL_ALREADY_IN_USE,
                "The email address is already in use by another account.",
            )),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<Identity> {
        let email = normalize_email(email);
        self.attempts.check(&email)?;

        let Some(row) = self.user_by_email(&email).await? else {
            return Err(IdentityError::new(
                codes::USER_NOT_FOUND,
                "There is no user record corresponding to this identifier.",
            ));
        };
        let valid = row
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(password, hash));
        if !valid {
            self.attempts.record_failure(&email);
            return Err(IdentityError::new(codes::WRONG_PASSWORD, "The password is invalid."));
        }
        self.attempts.record_success(&email);
        self.start_session(row.to_domain()).await
    }

    async fn authenticate_interactive(&self) -> IdentityResult<Identity> {
        let profile = self.consent.request().await?;
        let email = normalize_email(&profile.email);

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (uid, email, display_name, phone_number, photo_url) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (email) DO UPDATE SET \
                display_name = COALESCE(EXCLUDED.display_name, users.display_name), \
                phone_number = COALESCE(EXCLUDED.phone_number, users.phone_number), \
                photo_url = COALESCE(EXCLUDED.photo_url, users.photo_url) \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&profile.display_name)
        .bind(&profile.phone_number)
        .bind(&profile.photo_url)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        self.start_session(row.to_domain()).await
    }

    async fn end_session(&self) -> IdentityResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE client_id = $1")
            .bind(&self.client_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        info!("Provider session ended.");
        self.feed.set(None);
        Ok(())
    }

    async fn update_display_name(&self, identity: &Identity, name: &str) -> IdentityResult<()> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET display_name = $2 WHERE uid = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(identity.uid)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| IdentityError::new(codes::USER_NOT_FOUND, "No such user."))?;

        let updated = row.to_domain();
        if self.feed.current().is_some_and(|current| current.uid == updated.uid) {
            self.feed.set(Some(updated));
        }
        Ok(())
    }

    fn on_identity_change(&self) -> IdentityChanges {
        self.feed.changes()
    }
}
