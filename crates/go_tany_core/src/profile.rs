//! crates/go_tany_core/src/profile.rs
//!
//! Profile document operations used by the views: favorites, profile edits and
//! scan history.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::domain::{DiseaseId, ProfileUpdate, ScanRecord};
use crate::ports::{DocumentStore, PortResult};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Adds `disease_id` to the saved set. Returns whether the set changed.
    pub async fn try_save_favorite(&self, uid: Uuid, disease_id: DiseaseId) -> PortResult<bool> {
        let Some(profile) = self.store.get_profile(uid).await? else {
            return Ok(false);
        };
        let mut saved = profile.saved_diseases;
        if !saved.insert(disease_id) {
            return Ok(false);
        }
        self.store.set_saved_diseases(uid, &saved).await?;
        Ok(true)
    }

    /// Removes `disease_id` from the saved set. Returns whether the set changed.
    pub async fn try_remove_favorite(&self, uid: Uuid, disease_id: DiseaseId) -> PortResult<bool> {
        let Some(profile) = self.store.get_profile(uid).await? else {
            return Ok(false);
        };
        let mut saved = profile.saved_diseases;
        let removed = saved.remove(&disease_id);
        self.store.set_saved_diseases(uid, &saved).await?;
        Ok(removed)
    }

    /// Best-effort variant of [`Self::try_save_favorite`]; failures are logged.
    pub async fn save_favorite(&self, uid: Uuid, disease_id: DiseaseId) -> bool {
        self.try_save_favorite(uid, disease_id)
            .await
            .unwrap_or_else(|e| {
                warn!(uid = %uid, disease_id, "Failed to save favorite: {}", e);
                false
            })
    }

    /// Best-effort variant of [`Self::try_remove_favorite`]; failures are logged.
    pub async fn remove_favorite(&self, uid: Uuid, disease_id: DiseaseId) -> bool {
        self.try_remove_favorite(uid, disease_id)
            .await
            .unwrap_or_else(|e| {
                warn!(uid = %uid, disease_id, "Failed to remove favorite: {}", e);
                false
            })
    }

    pub async fn update_profile(&self, uid: Uuid, update: ProfileUpdate) -> PortResult<()> {
        if update.is_empty() {
            return Ok(());
        }
        self.store.update_profile(uid, update).await
    }

    pub async fn scan_history(&self, uid: Uuid, limit: Option<usize>) -> PortResult<Vec<ScanRecord>> {
        self.store
            .scan_history(uid, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await
    }
}
