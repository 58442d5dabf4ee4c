mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use common::{eventually, identity, FakeBlobs, FakeStore, FixedPredictor};
use go_tany_core::analysis::mock_results;
use go_tany_core::{AnalysisError, Analyzer, ImageFile};

fn leaf() -> ImageFile {
    ImageFile::new("daun.jpg", "image/jpeg", Bytes::from_static(b"\xff\xd8\xff\xe0"))
}

fn analyzer(blobs: Arc<FakeBlobs>, store: Arc<FakeStore>, succeed: bool) -> Analyzer {
    let predictor = FixedPredictor {
        result: succeed.then(|| mock_results()[0].clone()),
    };
    Analyzer::new(Arc::new(predictor), blobs, store)
}

#[tokio::test]
async fn signed_in_scan_is_uploaded_and_recorded() {
    let blobs = FakeBlobs::new();
    let store = FakeStore::new();
    let user = identity("petani@example.com");

    let result = analyzer(blobs.clone(), store.clone(), true)
        .run(leaf(), Some(&user))
        .await
        .unwrap();
    assert_eq!(result.disease, "Hawar Daun Kentang");

    eventually(|| !store.scans_of(user.uid).is_empty()).await;
    let scans = store.scans_of(user.uid);
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].confidence, 94);

    let puts = blobs.puts.lock().unwrap().clone();
    assert_eq!(puts.len(), 1);
    assert!(puts[0].0.starts_with(&format!("scans/{}/", user.uid)));
    assert_eq!(puts[0].2, "image/jpeg");
    assert_eq!(scans[0].image_url, Some(format!("https://blobs.test/{}", puts[0].0)));
}

#[tokio::test]
async fn anonymous_scan_touches_no_storage() {
    let blobs = FakeBlobs::new();
    let store = FakeStore::new();

    let result = analyzer(blobs.clone(), store.clone(), true)
        .run(leaf(), None)
        .await;
    assert!(result.is_ok());

    tokio::task::yield_now().await;
    assert!(blobs.puts.lock().unwrap().is_empty());
    assert!(store.scans.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upload_failure_still_records_the_scan() {
    let blobs = FakeBlobs::new();
    blobs.fail.store(true, Ordering::SeqCst);
    let store = FakeStore::new();
    let user = identity("petani@example.com");

    let result = analyzer(blobs, store.clone(), true)
        .run(leaf(), Some(&user))
        .await;
    assert!(result.is_ok());

    eventually(|| !store.scans_of(user.uid).is_empty()).await;
    assert_eq!(store.scans_of(user.uid)[0].image_url, None);
}

#[tokio::test]
async fn store_failure_does_not_fail_the_scan() {
    let store = FakeStore::new();
    store.fail.store(true, Ordering::SeqCst);
    let user = identity("petani@example.com");

    let result = analyzer(FakeBlobs::new(), store, true)
        .run(leaf(), Some(&user))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn predictor_failure_surfaces_as_failed() {
    let result = analyzer(FakeBlobs::new(), FakeStore::new(), false)
        .run(leaf(), None)
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, AnalysisError::Failed(_)));
    assert_eq!(err.to_string(), "Gagal menganalisis gambar. Silakan coba lagi.");
}

#[tokio::test]
async fn invalid_files_are_rejected_before_upload() {
    let blobs = FakeBlobs::new();
    let user = identity("petani@example.com");
    let pdf = ImageFile::new("laporan.pdf", "application/pdf", Bytes::from_static(b"%PDF"));

    let err = analyzer(blobs.clone(), FakeStore::new(), true)
        .run(pdf, Some(&user))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::NotAnImage));
    assert!(blobs.puts.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn mock_predictor_takes_at_least_two_seconds() {
    let analyzer = Analyzer::new(
        Arc::new(go_tany_core::MockPredictor::default()),
        FakeBlobs::new(),
        FakeStore::new(),
    );
    let started = tokio::time::Instant::now();
    let result = analyzer.run(leaf(), None).await.unwrap();
    assert!(started.elapsed() >= std::time::Duration::from_millis(2000));
    assert!(mock_results().contains(&result));
}
