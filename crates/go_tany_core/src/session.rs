//! crates/go_tany_core/src/session.rs
//!
//! The process-wide authentication state and the operations that change it.
//!
//! A single writer task owns the [`SessionState`]. Identity provider notifications and
//! the results of direct sign-in/out calls are sent to its mailbox and applied in
//! arrival order, so when both report an identity the later one wins. Every applied
//! update is published as a snapshot on a `watch` channel that views read.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{Identity, NewProfile, UserProfile};
use crate::errors::{AuthFailure, AuthResult};
use crate::guard::AuthPhase;
use crate::ports::{DocumentStore, IdentityProvider};

//=========================================================================================
// SessionState
//=========================================================================================

/// Snapshot of the authentication state.
///
/// `profile` is only ever set while `identity` is, but may lag behind it while the
/// profile document is being fetched. `is_resolving` goes from `true` to `false` once
/// and stays there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub profile: Option<UserProfile>,
    pub is_resolving: bool,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            identity: None,
            profile: None,
            is_resolving: true,
        }
    }

    pub fn phase(&self) -> AuthPhase {
        AuthPhase::from(self)
    }

    fn uid(&self) -> Option<Uuid> {
        self.identity.as_ref().map(|i| i.uid)
    }
}

//=========================================================================================
// The writer task
//=========================================================================================

#[derive(Debug)]
enum Update {
    /// A notification from the identity provider.
    ProviderChanged(Option<Identity>),
    /// A direct sign-in call succeeded.
    SignedIn(Identity),
    /// A direct sign-out call succeeded.
    SignedOut,
    /// Re-read the profile of the current identity.
    RefreshProfile,
}

struct ProfileLoad {
    uid: Uuid,
    /// Issue order of the fetch.
    seq: u64,
    profile: Option<UserProfile>,
}

struct SessionWriter {
    state: SessionState,
    store: Arc<dyn DocumentStore>,
    mailbox: mpsc::UnboundedReceiver<Update>,
    published: watch::Sender<SessionState>,
    loads: JoinSet<ProfileLoad>,
    /// Sequence of the last profile fetch issued.
    issued: u64,
    /// Sequence of the last profile load applied to the state.
    applied: u64,
    /// Lowest sequence that belongs to the current identity.
    identity_from: u64,
    /// Loads at or above this sequence end resolution.
    resolves_with: Option<u64>,
}

impl SessionWriter {
    fn new(
        store: Arc<dyn DocumentStore>,
        mailbox: mpsc::UnboundedReceiver<Update>,
        published: watch::Sender<SessionState>,
    ) -> Self {
        Self {
            state: SessionState::initial(),
            store,
            mailbox,
            published,
            loads: JoinSet::new(),
            issued: 0,
            applied: 0,
            identity_from: 0,
            resolves_with: None,
        }
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                update = self.mailbox.recv() => match update {
                    Some(update) => self.apply(update),
                    None => break,
                },
                Some(joined) = self.loads.join_next(), if !self.loads.is_empty() => match joined {
                    Ok(load) => self.apply_profile(load),
                    Err(e) => warn!("Profile fetch task failed: {}", e),
                },
            }
        }
        debug!("Session writer stopped.");
    }

    fn apply(&mut self, update: Update) {
        match update {
            Update::ProviderChanged(Some(identity)) => {
                let seq = self.set_identity(identity);
                if self.state.is_resolving {
                    self.resolves_with = Some(seq);
                }
            }
            Update::ProviderChanged(None) => {
                self.clear_identity();
                self.resolve();
            }
            Update::SignedIn(identity) => {
                self.set_identity(identity);
            }
            Update::SignedOut => self.clear_identity(),
            Update::RefreshProfile => {
                if let Some(uid) = self.state.uid() {
                    self.fetch_profile(uid);
                }
            }
        }
        self.publish();
    }

    fn set_identity(&mut self, identity: Identity) -> u64 {
        let uid = identity.uid;
        if self.state.uid() != Some(uid) {
            self.state.profile = None;
        }
        info!(uid = %uid, "Session identity set.");
        self.state.identity = Some(identity);
        let seq = self.fetch_profile(uid);
        self.identity_from = seq;
        seq
    }

    fn clear_identity(&mut self) {
        if self.state.identity.take().is_some() {
            info!("Session identity cleared.");
        }
        self.state.profile = None;
        self.identity_from = self.issued + 1;
    }

    fn resolve(&mut self) {
        self.resolves_with = None;
        if self.state.is_resolving {
            self.state.is_resolving = false;
            info!("Session resolved.");
        }
    }

    fn fetch_profile(&mut self, uid: Uuid) -> u64 {
        self.issued += 1;
        let seq = self.issued;
        let store = self.store.clone();
        self.loads.spawn(async move {
            let profile = match store.get_profile(uid).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(uid = %uid, "Failed to fetch profile: {}", e);
                    None
                }
            };
            ProfileLoad { uid, seq, profile }
        });
        seq
    }

    fn apply_profile(&mut self, load: ProfileLoad) {
        // Only a load newer than the last applied one, issued for the current identity.
        let fresh = load.seq > self.applied && load.seq >= self.identity_from;
        if fresh && self.state.uid() == Some(load.uid) {
            self.applied = load.seq;
            self.state.profile = load.profile;
        } else {
            debug!(uid = %load.uid, seq = load.seq, "Dropped a superseded profile load.");
        }
        if self.resolves_with.is_some_and(|seq| load.seq >= seq) {
            self.resolve();
        }
        self.publish();
    }

    fn publish(&self) {
        self.published.send_if_modified(|published| {
            if *published == self.state {
                false
            } else {
                *published = self.state.clone();
                true
            }
        });
    }
}

//=========================================================================================
// SessionHolder
//=========================================================================================

struct Inner {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    updates: mpsc::UnboundedSender<Update>,
    state: watch::Receiver<SessionState>,
}

/// Owner of the session state. Construct one at startup and hand clones to consumers.
///
/// Must be created inside a Tokio runtime; the writer task stops once every clone
/// and every [`Subscription`] is dropped.
#[derive(Clone)]
pub struct SessionHolder {
    inner: Arc<Inner>,
}

impl SessionHolder {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let (updates, mailbox) = mpsc::unbounded_channel();
        let (published, state) = watch::channel(SessionState::initial());
        tokio::spawn(SessionWriter::new(store.clone(), mailbox, published).run());

        Self {
            inner: Arc::new(Inner {
                identity,
                store,
                updates,
                state,
            }),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.clone()
    }

    /// Waits until the first identity callback has been fully applied.
    pub async fn resolved(&self) -> SessionState {
        let mut rx = self.watch();
        loop {
            {
                let state = rx.borrow_and_update();
                if !state.is_resolving {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    fn send(&self, update: Update) {
        if self.inner.updates.send(update).is_err() {
            warn!("Session writer is gone; update dropped.");
        }
    }

    /// Starts listening to the identity provider. Release by dropping the returned
    /// [`Subscription`] or calling [`Subscription::unsubscribe`].
    pub fn subscribe(&self) -> Subscription {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let mut changes = self.inner.identity.on_identity_change();
        let updates = self.inner.updates.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    next = changes.next() => match next {
                        Some(identity) => {
                            if updates.send(Update::ProviderChanged(identity)).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            debug!("Identity subscription released.");
        });

        Subscription {
            token,
            handle: Some(handle),
        }
    }

    /// Creates an identity and its profile document.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        phone: &str,
    ) -> AuthResult<Identity> {
        let result = async {
            let identity = self.inner.identity.create_identity(email, password).await?;
            self.inner
                .identity
                .update_display_name(&identity, full_name)
                .await?;
            let identity = Identity {
                display_name: Some(full_name.to_string()),
                ..identity
            };
            self.inner
                .store
                .create_profile(NewProfile {
                    uid: identity.uid,
                    email: email.to_string(),
                    full_name: full_name.to_string(),
                    phone: phone.to_string(),
                    photo_url: identity.photo_url.clone().unwrap_or_default(),
                })
                .await?;
            Ok::<_, AuthFailure>(identity)
        }
        .await;

        self.finish_sign_in("sign up", result)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let result = self
            .inner
            .identity
            .authenticate(email, password)
            .await
            .map_err(AuthFailure::from);

        self.finish_sign_in("sign in", result)
    }

    /// Runs the federated consent flow and creates a profile on first sign-in.
    pub async fn sign_in_with_federated_provider(&self) -> AuthResult<Identity> {
        let result = async {
            let identity = self.inner.identity.authenticate_interactive().await?;
            if self.inner.store.get_profile(identity.uid).await?.is_none() {
                self.inner
                    .store
                    .create_profile(NewProfile {
                        uid: identity.uid,
                        email: identity.email.clone().unwrap_or_default(),
                        full_name: identity.display_name.clone().unwrap_or_default(),
                        phone: identity.phone_number.clone().unwrap_or_default(),
                        photo_url: identity.photo_url.clone().unwrap_or_default(),
                    })
                    .await?;
            }
            Ok::<_, AuthFailure>(identity)
        }
        .await;

        self.finish_sign_in("federated sign in", result)
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        match self.inner.identity.end_session().await {
            Ok(()) => {
                self.send(Update::SignedOut);
                Ok(())
            }
            Err(e) => {
                warn!("Sign out failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Re-reads the current user's profile document, e.g. after favorites change.
    pub fn refresh_profile(&self) {
        self.send(Update::RefreshProfile);
    }

    fn finish_sign_in(&self, action: &str, result: AuthResult<Identity>) -> AuthResult<Identity> {
        match result {
            Ok(identity) => {
                self.send(Update::SignedIn(identity.clone()));
                Ok(identity)
            }
            Err(failure) => {
                warn!(kind = ?failure.kind, "{} failed", action);
                Err(failure)
            }
        }
    }
}

//=========================================================================================
// Subscription
//=========================================================================================

/// A live identity provider subscription. Dropping it unsubscribes.
pub struct Subscription {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stops delivery and waits for the listener task to finish.
    pub async fn unsubscribe(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Identity subscription task failed: {}", e);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
