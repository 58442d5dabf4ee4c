//! In-process fakes for the core ports.
#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use go_tany_core::domain::{
    AnalysisResult, DiseaseId, DiseaseRecord, Identity, ImageFile, NewProfile, NewScan,
    ProfileUpdate, ScanRecord, UserProfile,
};
use go_tany_core::errors::codes;
use go_tany_core::ports::{
    BlobStore, DiseasePredictor, DocumentStore, IdentityChanges, IdentityError,
    IdentityProvider, IdentityResult, PortError, PortResult,
};
use go_tany_core::session::SessionState;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

pub fn identity(email: &str) -> Identity {
    Identity {
        uid: Uuid::new_v4(),
        email: Some(email.to_string()),
        display_name: None,
        phone_number: None,
        photo_url: None,
    }
}

pub fn profile_for(identity: &Identity, full_name: &str) -> UserProfile {
    let now = Utc::now();
    UserProfile {
        uid: identity.uid,
        email: identity.email.clone().unwrap_or_default(),
        full_name: full_name.to_string(),
        phone: String::new(),
        photo_url: String::new(),
        created_at: now,
        updated_at: now,
        scan_history: Vec::new(),
        saved_diseases: BTreeSet::new(),
    }
}

/// Waits until a published snapshot satisfies `pred`.
pub async fn wait_for(
    mut rx: watch::Receiver<SessionState>,
    pred: impl Fn(&SessionState) -> bool,
) -> SessionState {
    tokio::time::timeout(Duration::from_secs(5), async move {
        loop {
            {
                let state = rx.borrow_and_update();
                if pred(&state) {
                    return state.clone();
                }
            }
            rx.changed().await.expect("session writer stopped");
        }
    })
    .await
    .expect("timed out waiting for session state")
}

/// Polls `check` until it holds.
pub async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never held");
}

//=========================================================================================
// Identity provider
//=========================================================================================

#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    federated: Mutex<Option<Identity>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Option<Identity>>>>,
    pub fail_sign_out: AtomicBool,
}

impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, email: &str, password: &str) -> Identity {
        let identity = identity(email);
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), identity.clone()));
        identity
    }

    pub fn set_federated(&self, identity: Option<Identity>) {
        *self.federated.lock().unwrap() = identity;
    }

    /// Delivers a change notification to every live subscriber.
    pub fn emit(&self, identity: Option<Identity>) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(identity.clone()).is_ok());
    }

    pub fn live_subscribers(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn create_identity(&self, email: &str, password: &str) -> IdentityResult<Identity> {
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(IdentityError::new(codes::EMAIL_ALREADY_IN_USE, "taken"));
        }
        let identity = self.register(email, password);
        self.emit(Some(identity.clone()));
        Ok(identity)
    }

    async fn authenticate(&self, email: &str, password: &str) -> IdentityResult<Identity> {
        let found = self.accounts.lock().unwrap().get(email).cloned();
        match found {
            None => Err(IdentityError::new(codes::USER_NOT_FOUND, "no such user")),
            Some((stored, _)) if stored != password => {
                Err(IdentityError::new(codes::WRONG_PASSWORD, "bad password"))
            }
            Some((_, identity)) => {
                self.emit(Some(identity.clone()));
                Ok(identity)
            }
        }
    }

    async fn authenticate_interactive(&self) -> IdentityResult<Identity> {
        let federated = self.federated.lock().unwrap().clone();
        match federated {
            Some(identity) => {
                self.emit(Some(identity.clone()));
                Ok(identity)
            }
            None => Err(IdentityError::new(codes::POPUP_CLOSED_BY_USER, "closed")),
        }
    }

    async fn end_session(&self) -> IdentityResult<()> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(IdentityError::new(codes::NETWORK_REQUEST_FAILED, "offline"));
        }
        self.emit(None);
        Ok(())
    }

    async fn update_display_name(&self, _identity: &Identity, _name: &str) -> IdentityResult<()> {
        Ok(())
    }

    fn on_identity_change(&self) -> IdentityChanges {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }))
    }
}

//=========================================================================================
// Document store
//=========================================================================================

#[derive(Default)]
pub struct FakeStore {
    pub profiles: Mutex<HashMap<Uuid, UserProfile>>,
    pub scans: Mutex<Vec<(Uuid, ScanRecord)>>,
    pub diseases: Mutex<Vec<DiseaseRecord>>,
    pub fail: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_profile(&self, profile: UserProfile) {
        self.profiles.lock().unwrap().insert(profile.uid, profile);
    }

    pub fn profile(&self, uid: Uuid) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(&uid).cloned()
    }

    pub fn scans_of(&self, uid: Uuid) -> Vec<ScanRecord> {
        self.scans
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == uid)
            .map(|(_, scan)| scan.clone())
            .collect()
    }

    fn check(&self) -> PortResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(PortError::Unexpected("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn get_profile(&self, uid: Uuid) -> PortResult<Option<UserProfile>> {
        self.check()?;
        Ok(self.profile(uid))
    }

    async fn create_profile(&self, profile: NewProfile) -> PortResult<()> {
        self.check()?;
        let now = Utc::now();
        let mut profiles = self.profiles.lock().unwrap();
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
        Ok(())
    }

    async fn update_profile(&self, uid: Uuid, update: ProfileUpdate) -> PortResult<()> {
        self.check()?;
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&uid)
            .ok_or_else(|| PortError::NotFound(format!("profile {}", uid)))?;
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
        self.check()?;
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&uid)
            .ok_or_else(|| PortError::NotFound(format!("profile {}", uid)))?;
        profile.saved_diseases = saved.clone();
        Ok(())
    }

    async fn save_scan(&self, uid: Uuid, scan: NewScan) -> PortResult<Uuid> {
        self.check()?;
        let id = Uuid::new_v4();
        self.scans.lock().unwrap().push((
            uid,
            ScanRecord {
                id,
                disease: scan.disease,
                confidence: scan.confidence,
                disease_type: scan.disease_type,
                plant: scan.plant,
                image_url: scan.image_url,
                created_at: Utc::now(),
            },
        ));
        Ok(id)
    }

    async fn scan_history(&self, uid: Uuid, limit: usize) -> PortResult<Vec<ScanRecord>> {
        self.check()?;
        let mut scans = self.scans_of(uid);
        scans.reverse();
        scans.truncate(limit);
        Ok(scans)
    }

    async fn list_diseases(&self) -> PortResult<Vec<DiseaseRecord>> {
        self.check()?;
        let mut diseases = self.diseases.lock().unwrap().clone();
        diseases.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(diseases)
    }

    async fn get_disease(&self, id: DiseaseId) -> PortResult<Option<DiseaseRecord>> {
        self.check()?;
        Ok(self.diseases.lock().unwrap().iter().find(|d| d.id == id).cloned())
    }

    async fn diseases_by_type(&self, disease_type: &str) -> PortResult<Vec<DiseaseRecord>> {
        Ok(self
            .list_diseases()
            .await?
            .into_iter()
            .filter(|d| d.disease_type == disease_type)
            .collect())
    }

    async fn diseases_by_plant(&self, plant: &str) -> PortResult<Vec<DiseaseRecord>> {
        Ok(self
            .list_diseases()
            .await?
            .into_iter()
            .filter(|d| d.plant == plant)
            .collect())
    }

    async fn insert_disease(&self, disease: &DiseaseRecord) -> PortResult<DiseaseId> {
        self.check()?;
        let mut diseases = self.diseases.lock().unwrap();
        let id = diseases.len() as DiseaseId + 1;
        diseases.push(DiseaseRecord {
            id,
            ..disease.clone()
        });
        Ok(id)
    }
}

/// A [`FakeStore`] whose profile reads return late. Each read takes the document
/// first, then waits for the next queued delay (none when the queue is empty).
pub struct SlowStore {
    pub inner: Arc<FakeStore>,
    delays: Mutex<VecDeque<Duration>>,
    reads: AtomicUsize,
}

impl SlowStore {
    pub fn new(inner: Arc<FakeStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            delays: Mutex::new(VecDeque::new()),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn delay_next(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    /// Profile reads started so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn get_profile(&self, uid: Uuid) -> PortResult<Option<UserProfile>> {
        let profile = self.inner.get_profile(uid).await;
        let delay = self.delays.lock().unwrap().pop_front();
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        profile
    }

    async fn create_profile(&self, profile: NewProfile) -> PortResult<()> {
        self.inner.create_profile(profile).await
    }

    async fn update_profile(&self, uid: Uuid, update: ProfileUpdate) -> PortResult<()> {
        self.inner.update_profile(uid, update).await
    }

    async fn set_saved_diseases(&self, uid: Uuid, saved: &BTreeSet<DiseaseId>) -> PortResult<()> {
        self.inner.set_saved_diseases(uid, saved).await
    }

    async fn save_scan(&self, uid: Uuid, scan: NewScan) -> PortResult<Uuid> {
        self.inner.save_scan(uid, scan).await
    }

    async fn scan_history(&self, uid: Uuid, limit: usize) -> PortResult<Vec<ScanRecord>> {
        self.inner.scan_history(uid, limit).await
    }

    async fn list_diseases(&self) -> PortResult<Vec<DiseaseRecord>> {
        self.inner.list_diseases().await
    }

    async fn get_disease(&self, id: DiseaseId) -> PortResult<Option<DiseaseRecord>> {
        self.inner.get_disease(id).await
    }

    async fn diseases_by_type(&self, disease_type: &str) -> PortResult<Vec<DiseaseRecord>> {
        self.inner.diseases_by_type(disease_type).await
    }

    async fn diseases_by_plant(&self, plant: &str) -> PortResult<Vec<DiseaseRecord>> {
        self.inner.diseases_by_plant(plant).await
    }

    async fn insert_disease(&self, disease: &DiseaseRecord) -> PortResult<DiseaseId> {
        self.inner.insert_disease(disease).await
    }
}

//=========================================================================================
// Blob store and predictor
//=========================================================================================

#[derive(Default)]
pub struct FakeBlobs {
    pub puts: Mutex<Vec<(String, usize, String)>>,
    pub fail: AtomicBool,
}

impl FakeBlobs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    async fn put(&self, path: &str, bytes: Bytes, content_type: &str) -> PortResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        self.puts
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.len(), content_type.to_string()));
        Ok(format!("https://blobs.test/{}", path))
    }
}

pub struct FixedPredictor {
    pub result: Option<AnalysisResult>,
}

#[async_trait]
impl DiseasePredictor for FixedPredictor {
    async fn predict(&self, _image: &ImageFile) -> PortResult<AnalysisResult> {
        self.result
            .clone()
            .ok_or_else(|| PortError::Unexpected("model unavailable".to_string()))
    }
}
