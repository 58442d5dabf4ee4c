//! crates/go_tany_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport; the serde
//! derives only fix the field names views see.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Identifier of a catalog entry. Positive and unique within one catalog source.
pub type DiseaseId = u32;

/// A presentational label attached to a disease card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub icon: String,
    pub label: String,
}

/// One disease entry of a catalog.
///
/// Entries of the bundled catalog are built once at startup and never mutated.
/// `symptoms`, `prevention` and `treatment` keep their display order and may
/// contain duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseRecord {
    pub id: DiseaseId,
    pub title: String,
    #[serde(rename = "type")]
    pub disease_type: String,
    pub plant: String,
    pub image: String,
    pub description: String,
    pub symptoms: Vec<String>,
    pub prevention: Vec<String>,
    pub treatment: Vec<String>,
    /// Only remote entries carry a severity.
    pub severity: Option<String>,
    pub tags: Vec<Tag>,
}

/// The opaque authenticated-user handle handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    pub photo_url: Option<String>,
}

/// The extended per-user record kept in the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scan_history: Vec<Uuid>,
    pub saved_diseases: BTreeSet<DiseaseId>,
}

/// Fields of a profile document at creation time.
///
/// Timestamps are assigned by the store; scan history and saved diseases start empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub uid: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub photo_url: String,
}

/// A partial profile update. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone.is_none() && self.photo_url.is_none()
    }
}

/// What the analysis flow hands back to the scan view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub disease: String,
    /// Percentage, 0..=100.
    pub confidence: u8,
    #[serde(rename = "type")]
    pub disease_type: String,
    pub plant: String,
    pub severity: String,
    pub description: String,
    pub recommendations: Vec<String>,
}

/// A scan to be appended to a user's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScan {
    pub disease: String,
    pub confidence: u8,
    pub disease_type: String,
    pub plant: String,
    pub image_url: Option<String>,
}

impl NewScan {
    pub fn from_result(result: &AnalysisResult, image_url: Option<String>) -> Self {
        Self {
            disease: result.disease.clone(),
            confidence: result.confidence,
            disease_type: result.disease_type.clone(),
            plant: result.plant.clone(),
            image_url,
        }
    }
}

/// A stored scan history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: Uuid,
    pub disease: String,
    pub confidence: u8,
    #[serde(rename = "type")]
    pub disease_type: String,
    pub plant: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An uploaded image as received from the scan view.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
