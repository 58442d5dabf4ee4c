//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;
use std::time::Duration;

use go_tany_core::analysis::Analyzer;
use go_tany_core::catalog::CatalogSource;
use go_tany_core::ports::{BlobStore, DiseasePredictor, DocumentStore, IdentityProvider};
use go_tany_core::profile::ProfileService;
use go_tany_core::session::SessionHolder;
use tracing::warn;
use uuid::Uuid;

use crate::adapters::ConsentBroker;
use crate::config::Config;

/// How long a handler waits for the session to reflect its own sign-in or sign-out.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The shell serves exactly one client, so there is exactly one session.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: SessionHolder,
    pub profiles: ProfileService,
    pub analyzer: Analyzer,
    pub remote: CatalogSource,
    pub consent: Arc<ConsentBroker>,
}

impl AppState {
    /// Wires the collaborators together. Must run inside a Tokio runtime.
    pub fn new(
        config: Arc<Config>,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        predictor: Arc<dyn DiseasePredictor>,
        consent: Arc<ConsentBroker>,
    ) -> Self {
        Self {
            config,
            session: SessionHolder::new(identity, store.clone()),
            profiles: ProfileService::new(store.clone()),
            analyzer: Analyzer::new(predictor, blobs, store.clone()),
            remote: CatalogSource::Remote(store),
            consent,
        }
    }

    /// Waits until the published session carries `expected` as its identity.
    pub async fn settle(&self, expected: Option<Uuid>) {
        let mut rx = self.session.watch();
        let reached = async move {
            loop {
                if rx.borrow_and_update().identity.as_ref().map(|i| i.uid) == expected {
                    return;
                }
                if rx.changed().await.is_err() {
                    return;
                }
            }
        };
        if tokio::time::timeout(SETTLE_TIMEOUT, reached).await.is_err() {
            warn!("Session did not settle within {:?}.", SETTLE_TIMEOUT);
        }
    }
}
