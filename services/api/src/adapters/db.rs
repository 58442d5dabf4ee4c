//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use go_tany_core::domain::{
    DiseaseId, DiseaseRecord, NewProfile, NewScan, ProfileUpdate, ScanRecord, Tag, UserProfile,
};
use go_tany_core::ports::{DocumentStore, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const PROFILE_COLUMNS: &str = "p.uid, p.email, p.full_name, p.phone, p.photo_url, \
     p.saved_diseases, p.created_at, p.updated_at, \
     ARRAY(SELECT s.id FROM scans s WHERE s.uid = p.uid ORDER BY s.created_at) AS scan_history";

#[derive(FromRow)]
struct ProfileRecord {
    uid: Uuid,
    email: String,
    full_name: String,
    phone: String,
    photo_url: String,
    saved_diseases: Vec<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    scan_history: Vec<Uuid>,
}
impl ProfileRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            uid: self.uid,
            email: self.email,
            full_name: self.full_name,
            phone: self.phone,
            photo_url: self.photo_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
            scan_history: self.scan_history,
            saved_diseases: self
                .saved_diseases
                .into_iter()
                .filter_map(|id| DiseaseId::try_from(id).ok())
                .collect(),
        }
    }
}

const SCAN_COLUMNS: &str = "id, disease, confidence, disease_type, plant, image_url, created_at";

#[derive(FromRow)]
struct ScanRow {
    id: Uuid,
    disease: String,
    confidence: i16,
    disease_type: String,
    plant: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}
impl ScanRow {
    fn to_domain(self) -> ScanRecord {
        ScanRecord {
            id: self.id,
            disease: self.disease,
            confidence: self.confidence.clamp(0, 100) as u8,
            disease_type: self.disease_type,
            plant: self.plant,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

const DISEASE_COLUMNS: &str = "id, title, disease_type, plant, image, description, symptoms, \
     prevention, treatment, severity, tags";

#[derive(FromRow)]
struct DiseaseRow {
    id: i32,
    title: String,
    disease_type: String,
    plant: String,
    image: String,
    description: String,
    symptoms: Vec<String>,
    prevention: Vec<String>,
    treatment: Vec<String>,
    severity: Option<String>,
    tags: Json<Vec<Tag>>,
}
impl DiseaseRow {
    fn to_domain(self) -> DiseaseRecord {
        DiseaseRecord {
            id: DiseaseId::try_from(self.id).unwrap_or_default(),
            title: self.title,
            disease_type: self.disease_type,
            plant: self.plant,
            image: self.image,
            description: self.description,
            symptoms: self.symptoms,
            prevention: self.prevention,
            treatment: self.treatment,
            severity: self.severity,
            tags: self.tags.0,
        }
    }
}

fn saved_ids(saved: &BTreeSet<DiseaseId>) -> PortResult<Vec<i32>> {
    saved
        .iter()
        .map(|id| {
            i32::try_from(*id)
                .map_err(|_| PortError::Unexpected(format!("Disease id {} out of range", id)))
        })
        .collect()
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn get_profile(&self, uid: Uuid) -> PortResult<Option<UserProfile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {} FROM profiles p WHERE p.uid = $1",
            PROFILE_COLUMNS
        ))
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ProfileRecord::to_domain))
    }

    async fn create_profile(&self, profile: NewProfile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO profiles (uid, email, full_name, phone, photo_url) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (uid) DO UPDATE SET \
                email = EXCLUDED.email, full_name = EXCLUDED.full_name, \
                phone = EXCLUDED.phone, photo_url = EXCLUDED.photo_url, updated_at = NOW()",
        )
        .bind(profile.uid)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .bind(&profile.photo_url)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn update_profile(&self, uid: Uuid, update: ProfileUpdate) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE profiles SET \
                full_name = COALESCE($2, full_name), \
                phone = COALESCE($3, phone), \
                photo_url = COALESCE($4, photo_url), \
                updated_at = NOW() \
             WHERE uid = $1",
        )
        .bind(uid)
        .bind(update.full_name)
        .bind(update.phone)
        .bind(update.photo_url)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Profile {} not found", uid)));
        }
        Ok(())
    }

    async fn set_saved_diseases(&self, uid: Uuid, saved: &BTreeSet<DiseaseId>) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE profiles SET saved_diseases = $2, updated_at = NOW() WHERE uid = $1",
        )
        .bind(uid)
        .bind(saved_ids(saved)?)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Profile {} not found", uid)));
        }
        Ok(())
    }

    async fn save_scan(&self, uid: Uuid, scan: NewScan) -> PortResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO scans (id, uid, disease, confidence, disease_type, plant, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(uid)
        .bind(&scan.disease)
        .bind(i16::from(scan.confidence))
        .bind(&scan.disease_type)
        .bind(&scan.plant)
        .bind(&scan.image_url)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(id)
    }

    async fn scan_history(&self, uid: Uuid, limit: usize) -> PortResult<Vec<ScanRecord>> {
        let records = sqlx::query_as::<_, ScanRow>(&format!(
            "SELECT {} FROM scans WHERE uid = $1 ORDER BY created_at DESC LIMIT $2",
            SCAN_COLUMNS
        ))
        .bind(uid)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(ScanRow::to_domain).collect())
    }

    async fn list_diseases(&self) -> PortResult<Vec<DiseaseRecord>> {
        let records = sqlx::query_as::<_, DiseaseRow>(&format!(
            "SELECT {} FROM diseases ORDER BY title ASC",
            DISEASE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(DiseaseRow::to_domain).collect())
    }

    async fn get_disease(&self, id: DiseaseId) -> PortResult<Option<DiseaseRecord>> {
        let Ok(id) = i32::try_from(id) else {
            return Ok(None);
        };
        let record = sqlx::query_as::<_, DiseaseRow>(&format!(
            "SELECT {} FROM diseases WHERE id = $1",
            DISEASE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(DiseaseRow::to_domain))
    }

    async fn diseases_by_type(&self, disease_type: &str) -> PortResult<Vec<DiseaseRecord>> {
        let records = sqlx::query_as::<_, DiseaseRow>(&format!(
            "SELECT {} FROM diseases WHERE disease_type = $1 ORDER BY title ASC",
            DISEASE_COLUMNS
        ))
        .bind(disease_type)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(DiseaseRow::to_domain).collect())
    }

    async fn diseases_by_plant(&self, plant: &str) -> PortResult<Vec<DiseaseRecord>> {
        let records = sqlx::query_as::<_, DiseaseRow>(&format!(
            "SELECT {} FROM diseases WHERE plant = $1 ORDER BY title ASC",
            DISEASE_COLUMNS
        ))
        .bind(plant)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(DiseaseRow::to_domain).collect())
    }

    async fn insert_disease(&self, disease: &DiseaseRecord) -> PortResult<DiseaseId> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO diseases \
                (title, disease_type, plant, image, description, symptoms, prevention, treatment, severity, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id",
        )
        .bind(&disease.title)
        .bind(&disease.disease_type)
        .bind(&disease.plant)
        .bind(&disease.image)
        .bind(&disease.description)
        .bind(&disease.symptoms)
        .bind(&disease.prevention)
        .bind(&disease.treatment)
        .bind(&disease.severity)
        .bind(Json(&disease.tags))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        DiseaseId::try_from(id)
            .map_err(|_| PortError::Unexpected(format!("Unexpected disease id {}", id)))
    }
}
