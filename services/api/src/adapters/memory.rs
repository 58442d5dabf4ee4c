//! services/api/src/adapters/memory.rs
//!
//! In-memory implementations of the identity provider, document store and blob
//! store. Used when no `DATABASE_URL` is configured and by the web tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use go_tany_core::domain::{
    DiseaseId, DiseaseRecord, Identity, NewProfile, NewScan, ProfileUpdate, ScanRecord, UserProfile,
};
use go_tany_core::errors::codes;
use go_tany_core::ports::{
    BlobStore, DocumentStore, IdentityChanges, IdentityError, IdentityProvider, IdentityResult,
    PortError, PortResult,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::identity::{
    check_credentials, hash_password, internal, normalize_email, verify_password, AttemptTracker,
    ConsentBroker, IdentityFeed,
};

fn lock<T>(mutex: &Mutex<T>) -> PortResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
}

//=========================================================================================
// Identity provider
//=========================================================================================

struct Account {
    /// `None` for accounts created through the federated flow.
    password_hash: Option<String>,
    identity: Identity,
}

/// Accounts live for the lifetime of the process; nothing is restored at startup.
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    feed: IdentityFeed,
    consent: Arc<ConsentBroker>,
    attempts: AttemptTracker,
}

impl MemoryIdentityProvider {
    pub fn new(consent: Arc<ConsentBroker>) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            feed: IdentityFeed::ready(None),
            consent,
            attempts: AttemptTracker::default(),
        }
    }

    fn accounts(&self) -> IdentityResult<MutexGuard<'_, HashMap<String, Account>>> {
        self.accounts.lock().map_err(|_| internal("account lock poisoned"))
    }

    fn sign_in_as(&self, identity: Identity) -> Identity {
        info!(uid = %identity.uid, "Provider session started.");
        self.feed.set(Some(identity.clone()));
        identity
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> IdentityResult<Identity> {
        check_credentials(email, password)?;
        let key = normalize_email(email);
        let password_hash = hash_password(password)?;

        let identity = {
            let mut accounts = self.accounts()?;
            if accounts.contains_key(&key) {
                return Err(IdentityError::new(
                    codes::EMAIL_ALREADY_IN_USE,
                    "The email address is already in use by another account.",
                ));
            }
            let identity = Identity {
                uid: Uuid::new_v4(),
                email: Some(key.clone()),
                display_name: None,
                phone_number: None,
                photo_url: None,
            };
            accounts.insert(
                key,
                Account {
                    password_hash: Some(password_hash),
                    identity: identity.clone(),
                },
            );
            identity
        };
        Ok(self.sign_in_as(identity))
    }

    async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<Identity> {
        let key = normalize_email(email);
        self.attempts.check(&key)?;

        let found = {
            let accounts = self.accounts()?;
            accounts
                .get(&key)
                .map(|account| (account.password_hash.clone(), account.identity.clone()))
        };
        let Some((password_hash, identity)) = found else {
            return Err(IdentityError::new(
                codes::USER_NOT_FOUND,
                "There is no user record corresponding to this identifier.",
            ));
        };

        let valid = password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(password, hash));
        if !valid {
            self.attempts.record_failure(&key);
            return Err(IdentityError::new(codes::WRONG_PASSWORD, "The password is invalid."));
        }
        self.attempts.record_success(&key);
        Ok(self.sign_in_as(identity))
    }

    async fn authenticate_interactive(&self) -> IdentityResult<Identity> {
        let profile = self.consent.request().await?;
        let key = normalize_email(&profile.email);

        let identity = {
            let mut accounts = self.accounts()?;
            let account = accounts.entry(key.clone()).or_insert_with(|| Account {
                password_hash: None,
                identity: Identity {
                    uid: Uuid::new_v4(),
                    email: Some(key),
                    display_name: None,
                    phone_number: None,
                    photo_url: None,
                },
            });
            // The federated profile refreshes the provider-side fields on every sign-in.
            let identity = &mut account.identity;
            identity.display_name = profile.display_name.or(identity.display_name.take());
            identity.phone_number = profile.phone_number.or(identity.phone_number.take());
            identity.photo_url = profile.photo_url.or(identity.photo_url.take());
            identity.clone()
        };
        Ok(self.sign_in_as(identity))
    }

    async fn end_session(&self) -> IdentityResult<()> {
        if self.feed.current().is_some() {
            info!("Provider session ended.");
        }
        self.feed.set(None);
        Ok(())
    }

    async fn update_display_name(&self, identity: &Identity, name: &str) -> IdentityResult<()> {
        let updated = {
            let mut accounts = self.accounts()?;
            let account = accounts
                .values_mut()
                .find(|account| account.identity.uid == identity.uid)
                .ok_or_else(|| IdentityError::new(codes::USER_NOT_FOUND, "No such user."))?;
            account.identity.display_name = Some(name.to_string());
            account.identity.clone()
        };
        if self.feed.current().is_some_and(|current| current.uid == updated.uid) {
            self.feed.set(Some(updated));
        }
        Ok(())
    }

    fn on_identity_change(&self) -> IdentityChanges {
        self.feed.changes()
    }
}

//=========================================================================================
// Document store
//=========================================================================================

#[derive(Default)]
pub struct MemoryDocumentStore {
    profiles: Mutex<HashMap<Uuid, UserProfile>>,
    scans: Mutex<Vec<(Uuid, ScanRecord)>>,
    diseases: Mutex<Vec<DiseaseRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_title(mut diseases: Vec<DiseaseRecord>) -> Vec<DiseaseRecord> {
    diseases.sort_by(|a, b| a.title.cmp(&b.title));
    diseases
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_profile(&self, uid: Uuid) -> PortResult<Option<UserProfile>> {
        Ok(lock(&self.profiles)?.get(&uid).cloned())
    }

    async fn create_profile(&self, profile: NewProfile) -> PortResult<()> {
        let now = Utc::now();
        let mut profiles = lock(&self.profiles)?;
        let entry = profiles.entry(profile.uid).or_insert_with(|| UserProfile {
            uid: profile.uid,
            email: String::new(),
            full_name: String::new(),
            phone: String::new(),
            photo_url: String::new(),
            created_at: now,
            updated_at: now,
            scan_history: Vec::new(),
            saved_diseases: BTreeSet::new(),
        });
        entry.email = profile.email;
        entry.full_name = profile.full_name;
        entry.phone = profile.phone;
        entry.photo_url = profile.photo_url;
        entry.updated_at = now;
        debug!(uid = %profile.uid, "Profile document written.");
        Ok(())
    }

    async fn update_profile(&self, uid: Uuid, update: ProfileUpdate) -> PortResult<()> {
        let mut profiles = lock(&self.profiles)?;
        let profile = profiles
            .get_mut(&uid)
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", uid)))?;
        if let Some(full_name) = update.full_name {
            profile.full_name = full_name;
        }
        if let Some(phone) = update.phone {
            profile.phone = phone;
        }
        if let Some(photo_url) = update.photo_url {
            profile.photo_url = photo_url;
        }
        profile.updated_at = Utc::now();
        Ok(())
    }

    async fn set_saved_diseases(&self, uid: Uuid, saved: &BTreeSet<DiseaseId>) -> PortResult<()> {
        let mut profiles = lock(&self.profiles)?;
        let profile = profiles
            .get_mut(&uid)
            .ok_or_else(|| PortError::NotFound(format!("Profile {} not found", uid)))?;
        profile.saved_diseases = saved.clone();
        profile.updated_at = Utc::now();
        Ok(())
    }

    async fn save_scan(&self, uid: Uuid, scan: NewScan) -> PortResult<Uuid> {
        let record = ScanRecord {
            id: Uuid::new_v4(),
            disease: scan.disease,
            confidence: scan.confidence,
            disease_type: scan.disease_type,
            plant: scan.plant,
            image_url: scan.image_url,
            created_at: Utc::now(),
        };
        let id = record.id;
        lock(&self.scans)?.push((uid, record));
        if let Some(profile) = lock(&self.profiles)?.get_mut(&uid) {
            profile.scan_history.push(id);
        }
        Ok(id)
    }

    async fn scan_history(&self, uid: Uuid, limit: usize) -> PortResult<Vec<ScanRecord>> {
        let scans = lock(&self.scans)?;
        Ok(scans
            .iter()
            .rev()
            .filter(|(owner, _)| *owner == uid)
            .take(limit)
            .map(|(_, scan)| scan.clone())
            .collect())
    }

    async fn list_diseases(&self) -> PortResult<Vec<DiseaseRecord>> {
        Ok(sorted_by_title(lock(&self.diseases)?.clone()))
    }

    async fn get_disease(&self, id: DiseaseId) -> PortResult<Option<DiseaseRecord>> {
        Ok(lock(&self.diseases)?.iter().find(|d| d.id == id).cloned())
    }

    async fn diseases_by_type(&self, disease_type: &str) -> PortResult<Vec<DiseaseRecord>> {
        let diseases = lock(&self.diseases)?;
        Ok(sorted_by_title(
            diseases
                .iter()
                .filter(|d| d.disease_type == disease_type)
                .cloned()
                .collect(),
        ))
    }

    async fn diseases_by_plant(&self, plant: &str) -> PortResult<Vec<DiseaseRecord>> {
        let diseases = lock(&self.diseases)?;
        Ok(sorted_by_title(
            diseases.iter().filter(|d| d.plant == plant).cloned().collect(),
        ))
    }

    async fn insert_disease(&self, disease: &DiseaseRecord) -> PortResult<DiseaseId> {
        let mut diseases = lock(&self.diseases)?;
        let id = diseases.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        diseases.push(DiseaseRecord {
            id,
            ..disease.clone()
        });
        Ok(id)
    }
}

//=========================================================================================
// Blob store
//=========================================================================================

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<(Bytes, String)> {
        self.blobs.lock().ok()?.get(path).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> PortResult<String> {
        lock(&self.blobs)?.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(format!("memory://{}", path))
    }
}
