//! services/api/src/adapters/identity.rs
//!
//! Building blocks shared by the identity provider adapters: password hashing,
//! credential checks, the change feed, the federated consent broker and the
//! failed-attempt tracker.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, Instant};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use go_tany_core::domain::Identity;
use go_tany_core::errors::codes;
use go_tany_core::ports::{IdentityChanges, IdentityError, IdentityResult};
use regex::Regex;
use serde::Deserialize;
use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Provider-side minimum; the sign-up form asks for more.
pub const MIN_PROVIDER_PASSWORD_LEN: usize = 6;
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
pub const LOCKOUT: Duration = Duration::from_secs(60);

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

pub fn internal(message: impl Into<String>) -> IdentityError {
    IdentityError::new("auth/internal-error", message)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Rejects malformed emails and passwords below the provider minimum.
pub fn check_credentials(email: &str, password: &str) -> IdentityResult<()> {
    let valid = EMAIL_RE
        .as_ref()
        .map(|re| re.is_match(email.trim()))
        .unwrap_or(false);
    if !valid {
        return Err(IdentityError::new(codes::INVALID_EMAIL, "The email address is badly formatted."));
    }
    if password.chars().count() < MIN_PROVIDER_PASSWORD_LEN {
        return Err(IdentityError::new(
            codes::WEAK_PASSWORD,
            "Password should be at least 6 characters.",
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> IdentityResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            internal("Failed to hash password")
        })
}

pub fn verify_password(password: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Failed to parse password hash: {:?}", e);
            false
        }
    }
}

//=========================================================================================
// IdentityFeed
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum FeedState {
    /// The persisted session has not been looked at yet.
    Restoring,
    Ready(Option<Identity>),
}

/// The provider's current identity plus a change stream for subscribers.
///
/// Subscribers receive nothing while the feed is restoring. Once ready they get
/// the current identity, then every change. Back-to-back changes may coalesce
/// into the latest one.
pub struct IdentityFeed {
    tx: watch::Sender<FeedState>,
}

impl IdentityFeed {
    pub fn restoring() -> Self {
        let (tx, _) = watch::channel(FeedState::Restoring);
        Self { tx }
    }

    pub fn ready(identity: Option<Identity>) -> Self {
        let (tx, _) = watch::channel(FeedState::Ready(identity));
        Self { tx }
    }

    pub fn set(&self, identity: Option<Identity>) {
        let next = FeedState::Ready(identity);
        self.tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    pub fn current(&self) -> Option<Identity> {
        match &*self.tx.borrow() {
            FeedState::Ready(identity) => identity.clone(),
            FeedState::Restoring => None,
        }
    }

    pub fn changes(&self) -> IdentityChanges {
        let mut rx = self.tx.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                let ready = match &*rx.borrow_and_update() {
                    FeedState::Ready(identity) => Some(identity.clone()),
                    FeedState::Restoring => None,
                };
                if let Some(identity) = ready {
                    yield identity;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

//=========================================================================================
// ConsentBroker
//=========================================================================================

/// The profile a federated provider hands back once the user consents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FederatedProfile {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Holds at most one pending consent request.
///
/// A request ends when it is completed, dismissed, superseded by a newer request,
/// or when the timeout elapses. Everything but completion surfaces as
/// `auth/popup-closed-by-user`.
pub struct ConsentBroker {
    pending: Mutex<Option<oneshot::Sender<Option<FederatedProfile>>>>,
    timeout: Duration,
}

impl ConsentBroker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(None),
            timeout,
        }
    }

    fn closed() -> IdentityError {
        IdentityError::new(codes::POPUP_CLOSED_BY_USER, "The popup has been closed by the user.")
    }

    pub async fn request(&self) -> IdentityResult<FederatedProfile> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().map_err(|_| internal("consent lock poisoned"))?;
            if pending.replace(tx).is_some() {
                info!("Superseding a pending consent request.");
            }
        }
        info!("Waiting for federated consent.");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Some(profile))) => Ok(profile),
            Ok(Ok(None)) | Ok(Err(_)) => Err(Self::closed()),
            Err(_) => {
                warn!("Federated consent timed out.");
                if let Ok(mut pending) = self.pending.lock() {
                    // Only clear our own request.
                    if pending.as_ref().is_some_and(|tx| tx.is_closed()) {
                        pending.take();
                    }
                }
                Err(Self::closed())
            }
        }
    }

    fn resolve(&self, outcome: Option<FederatedProfile>) -> bool {
        let sender = match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(_) => None,
        };
        match sender {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Completes the pending request. Returns `false` if none was waiting.
    pub fn complete(&self, profile: FederatedProfile) -> bool {
        self.resolve(Some(profile))
    }

    /// Dismisses the pending request. Returns `false` if none was waiting.
    pub fn dismiss(&self) -> bool {
        self.resolve(None)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.as_ref().is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }
}

//=========================================================================================
// AttemptTracker
//=========================================================================================

struct Failures {
    count: u32,
    last: Instant,
}

/// Counts consecutive failed password checks per email.
#[derive(Default)]
pub struct AttemptTracker {
    failures: Mutex<HashMap<String, Failures>>,
}

impl AttemptTracker {
    /// Fails with `auth/too-many-requests` while `email` is locked out.
    pub fn check(&self, email: &str) -> IdentityResult<()> {
        let mut failures = self.failures.lock().map_err(|_| internal("attempt lock poisoned"))?;
        match failures.get(email) {
            Some(f) if f.last.elapsed() >= LOCKOUT => {
                failures.remove(email);
                Ok(())
            }
            Some(f) if f.count >= MAX_FAILED_ATTEMPTS => Err(IdentityError::new(
                codes::TOO_MANY_REQUESTS,
                "Access to this account has been temporarily disabled.",
            )),
            _ => Ok(()),
        }
    }

    pub fn record_failure(&self, email: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            let entry = failures.entry(email.to_string()).or_insert(Failures {
                count: 0,
                last: Instant::now(),
            });
            entry.count += 1;
            entry.last = Instant::now();
        }
    }

    pub fn record_success(&self, email: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(email);
        }
    }
}
