//! crates/go_tany_core/src/analysis.rs
//!
//! The scan flow: validate an image, optionally upload it, ask a predictor for a
//! result, and optionally record the result in the user's scan history.
//!
//! [`MockPredictor`] is not a model. It waits a fixed delay and returns one of three
//! canned results at random. A real model plugs in behind [`DiseasePredictor`].

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::{error, info, warn};

use crate::domain::{AnalysisResult, Identity, ImageFile, NewScan};
use crate::ports::{BlobStore, DiseasePredictor, DocumentStore, PortError, PortResult};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const SIMULATED_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Mohon upload file gambar (JPG, PNG, etc.)")]
    NotAnImage,
    #[error("Ukuran file maksimal 10MB")]
    TooLarge { size: usize },
    #[error("Gagal menganalisis gambar. Silakan coba lagi.")]
    Failed(#[source] PortError),
}

impl ImageFile {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.content_type.starts_with("image/") {
            return Err(AnalysisError::NotAnImage);
        }
        if self.size() > MAX_IMAGE_BYTES {
            return Err(AnalysisError::TooLarge { size: self.size() });
        }
        Ok(())
    }
}

//=========================================================================================
// Mock predictor
//=========================================================================================

fn canned(
    disease: &str,
    confidence: u8,
    disease_type: &str,
    plant: &str,
    severity: &str,
    description: &str,
    recommendations: [&str; 4],
) -> AnalysisResult {
    AnalysisResult {
        disease: disease.to_string(),
        confidence,
        disease_type: disease_type.to_string(),
        plant: plant.to_string(),
        severity: severity.to_string(),
        description: description.to_string(),
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
    }
}

static MOCK_RESULTS: LazyLock<[AnalysisResult; 3]> = LazyLock::new(|| {
    [
        canned(
            "Hawar Daun Kentang",
            94,
            "Jamur",
            "Kentang",
            "Tinggi",
            "Penyakit jamur yang menyebabkan kerusakan parah pada daun dan umbi kentang.",
            [
                "Aplikasi fungisida tembaga segera",
                "Cabut dan musnahkan tanaman yang terinfeksi parah",
                "Hindari penyiraman dari atas",
                "Tingkatkan sirkulasi udara di sekitar tanaman",
            ],
        ),
        canned(
            "Antraknosa",
            87,
            "Jamur",
            "Kedelai",
            "Sedang",
            "Penyakit jamur yang menyebabkan bercak coklat kehitaman pada daun.",
            [
                "Gunakan fungisida berbahan aktif mankozeb",
                "Pangkas bagian yang terinfeksi",
                "Perbaiki sistem drainase",
                "Rotasi tanaman setiap musim",
            ],
        ),
        canned(
            "Wereng Coklat",
            91,
            "Serangga",
            "Padi",
            "Tinggi",
            "Hama utama padi yang mengisap cairan tanaman.",
            [
                "Aplikasi insektisida selektif",
                "Atur jarak tanam yang optimal",
                "Gunakan varietas tahan wereng",
                "Lakukan penanaman serempak",
            ],
        ),
    ]
});

/// The three results the mock can return.
pub fn mock_results() -> &'static [AnalysisResult] {
    MOCK_RESULTS.as_slice()
}

/// Waits `delay`, then picks one of [`mock_results`] uniformly at random.
/// The image content is never looked at.
#[derive(Debug, Clone)]
pub struct MockPredictor {
    delay: Duration,
}

impl MockPredictor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockPredictor {
    fn default() -> Self {
        Self::new(SIMULATED_DELAY)
    }
}

#[async_trait]
impl DiseasePredictor for MockPredictor {
    async fn predict(&self, _image: &ImageFile) -> PortResult<AnalysisResult> {
        tokio::time::sleep(self.delay).await;
        let picked = mock_results().choose(&mut rand::thread_rng()).cloned();
        picked.ok_or_else(|| PortError::Unexpected("No mock results available".to_string()))
    }
}

//=========================================================================================
// Analyzer
//=========================================================================================

/// Runs the scan flow. Upload and history recording are detached tasks; their
/// failures are logged and never reach the caller.
#[derive(Clone)]
pub struct Analyzer {
    predictor: Arc<dyn DiseasePredictor>,
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn DocumentStore>,
}

impl Analyzer {
    pub fn new(
        predictor: Arc<dyn DiseasePredictor>,
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            predictor,
            blobs,
            store,
        }
    }

    pub async fn run(
        &self,
        image: ImageFile,
        identity: Option<&Identity>,
    ) -> Result<AnalysisResult, AnalysisError> {
        image.validate()?;

        let upload = identity.map(|identity| {
            let blobs = self.blobs.clone();
            let path = scan_image_path(identity, &image.file_name);
            let image = image.clone();
            tokio::spawn(async move {
                match blobs.put(&path, image.bytes, &image.content_type).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(path = %path, "Failed to upload scan image: {}", e);
                        None
                    }
                }
            })
        });

        let result = self.predictor.predict(&image).await.map_err(|e| {
            error!("Analysis failed: {}", e);
            AnalysisError::Failed(e)
        })?;
        info!(disease = %result.disease, confidence = result.confidence, "Analysis finished.");

        if let Some(identity) = identity {
            let store = self.store.clone();
            let uid = identity.uid;
            let scan_result = result.clone();
            tokio::spawn(async move {
                let image_url = match upload {
                    Some(handle) => handle.await.ok().flatten(),
                    None => None,
                };
                let scan = NewScan::from_result(&scan_result, image_url);
                if let Err(e) = store.save_scan(uid, scan).await {
                    warn!(uid = %uid, "Failed to save scan result: {}", e);
                }
            });
        }

        Ok(result)
    }
}

/// `scans/<uid>/<millis>_<file name>`. The file name is reduced to URL-safe
/// characters (ASCII letters, digits, `.`, `-`, `_`) so the stored reference
/// needs no escaping.
pub fn scan_image_path(identity: &Identity, file_name: &str) -> String {
    let file_name: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "scans/{}/{}_{}",
        identity.uid,
        Utc::now().timestamp_millis(),
        file_name
    )
}
