//! crates/go_tany_core/src/ports.rs
//!
//! Defines the contracts (traits) for every external collaborator the core talks to.
//! These traits form the boundary of the hexagonal architecture: the identity provider,
//! the document store, the blob store and the disease predictor are all plugged in
//! from the outside.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::BTreeSet;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{
    AnalysisResult, DiseaseId, DiseaseRecord, Identity, ImageFile, NewProfile, NewScan,
    ProfileUpdate, ScanRecord, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for document store, blob store and predictor operations.
/// This abstracts away the specific errors from external services (e.g., database, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// The `{code, message}` pair every identity provider failure surfaces as.
///
/// `code` follows the `auth/<reason>` convention, see [`crate::errors::codes`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct IdentityError {
    pub code: String,
    pub message: String,
}

impl IdentityError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Stream of identity changes. `None` means signed out.
///
/// The first item reports the provider's current identity once it is known;
/// every later item is a change.
pub type IdentityChanges = Pin<Box<dyn Stream<Item = Option<Identity>> + Send>>;

//=========================================================================================
// Collaborator Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_identity(&self, email: &str, password: &str) -> IdentityResult<Identity>;

    async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<Identity>;

    /// Runs the interactive (federated) consent flow and signs in the resulting identity.
    async fn authenticate_interactive(&self) -> IdentityResult<Identity>;

    async fn end_session(&self) -> IdentityResult<()>;

    async fn update_display_name(&self, identity: &Identity, name: &str) -> IdentityResult<()>;

    /// Subscribes to identity changes. Dropping the stream releases the subscription.
    fn on_identity_change(&self) -> IdentityChanges;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- User profiles ---
    async fn get_profile(&self, uid: Uuid) -> PortResult<Option<UserProfile>>;

    /// Creates the profile document, merging into an existing one.
    async fn create_profile(&self, profile: NewProfile) -> PortResult<()>;

    async fn update_profile(&self, uid: Uuid, update: ProfileUpdate) -> PortResult<()>;

    async fn set_saved_diseases(&self, uid: Uuid, saved: &BTreeSet<DiseaseId>) -> PortResult<()>;

    // --- Scan history ---
    async fn save_scan(&self, uid: Uuid, scan: NewScan) -> PortResult<Uuid>;

    /// Most recent first.
    async fn scan_history(&self, uid: Uuid, limit: usize) -> PortResult<Vec<ScanRecord>>;

    // --- Remote disease collection ---
    /// Ordered by title.
    async fn list_diseases(&self) -> PortResult<Vec<DiseaseRecord>>;

    async fn get_disease(&self, id: DiseaseId) -> PortResult<Option<DiseaseRecord>>;

    async fn diseases_by_type(&self, disease_type: &str) -> PortResult<Vec<DiseaseRecord>>;

    async fn diseases_by_plant(&self, plant: &str) -> PortResult<Vec<DiseaseRecord>>;

    /// Inserts a disease document. The record's `id` is ignored; the store assigns one.
    async fn insert_disease(&self, disease: &DiseaseRecord) -> PortResult<DiseaseId>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` under `path` and returns a retrievable reference URL.
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> PortResult<String>;
}

#[async_trait]
pub trait DiseasePredictor: Send + Sync {
    /// Produces a detection result for an already validated image.
    async fn predict(&self, image: &ImageFile) -> PortResult<AnalysisResult>;
}
