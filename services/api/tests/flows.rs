mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn register_signs_in_and_creates_the_profile() {
    let app = signed_out_app().await;

    let body = app.register("petani@gotany.id").await;
    assert_eq!(body["email"], "petani@gotany.id");
    assert_eq!(body["displayName"], "Siti Aminah");

    let session = body_json(app.get("/session").await).await;
    assert_eq!(session["phase"], "authenticated");
    assert_eq!(session["identity"]["uid"], body["uid"]);
    assert!(
        app.poll("/session", |session| {
            session["profile"]["fullName"] == "Siti Aminah"
        })
        .await
    );
}

#[tokio::test]
async fn register_rejects_invalid_forms_before_the_provider() {
    let app = signed_out_app().await;

    let mut form = register_body("petani@gotany.id");
    form["confirmPassword"] = json!("Berbeda123!");
    let response = app.json(Method::POST, "/auth/register", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Password tidak cocok");

    let mut form = register_body("petani@gotany.id");
    form["agreeTerms"] = json!(false);
    let response = app.json(Method::POST, "/auth/register", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Anda harus menyetujui syarat dan ketentuan"
    );
}

#[tokio::test]
async fn taken_email_is_a_conflict() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;
    app.empty(Method::POST, "/auth/logout").await;

    let response = app
        .json(Method::POST, "/auth/register", register_body("petani@gotany.id"))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"],
        "Email sudah terdaftar. Silakan gunakan email lain."
    );
}

#[tokio::test]
async fn login_failures_carry_friendly_messages() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;
    app.empty(Method::POST, "/auth/logout").await;

    let response = app
        .json(Method::POST, "/auth/login", json!({ "email": "", "password": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Mohon isi semua field");

    let response = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "petani@gotany.id", "password": "salah-sekali" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Password salah.");

    let response = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "asing@gotany.id", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Email tidak terdaftar.");

    let response = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "petani@gotany.id", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn catalog_filters_and_details() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;

    let all = body_json(app.get("/diseases").await).await;
    assert_eq!(all["total"], 12);

    let apples = body_json(app.get("/diseases?plantFilter=apple").await).await;
    assert_eq!(apples["total"], 3);
    assert!(apples["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|d| d["plant"] == "apple"));

    let searched = body_json(app.get("/diseases?searchTerm=ANTHRACNOSE&plantFilter=apple").await).await;
    assert_eq!(searched["total"], 1);
    assert_eq!(searched["items"][0]["title"], "Anthracnose pada Apple");

    let detail = app.get("/diseases/1").await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert_eq!(body_json(detail).await["id"], 1);

    for missing in ["/diseases/999", "/diseases/abc"] {
        let response = app.get(missing).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{missing}");
        assert_eq!(body_json(response).await["error"], "Penyakit tidak ditemukan");
    }

    let options = body_json(app.get("/diseases/filters").await).await;
    assert_eq!(options["allPlants"], "Semua Buah");
    assert_eq!(options["plants"][0], "apple");
}

#[tokio::test]
async fn remote_catalog_starts_empty() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;

    let response = app.get("/diseases/remote?search=padi").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total"], 0);
}

#[tokio::test]
async fn favorites_behave_as_a_set_and_reach_the_session() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;

    let first = body_json(app.empty(Method::POST, "/favorites/3").await).await;
    assert_eq!(first, json!({ "diseaseId": 3, "changed": true }));
    let again = body_json(app.empty(Method::POST, "/favorites/3").await).await;
    assert_eq!(again["changed"], false);

    assert!(
        app.poll("/session", |session| {
            session["profile"]["savedDiseases"] == json!([3])
        })
        .await
    );

    let removed = body_json(app.empty(Method::DELETE, "/favorites/3").await).await;
    assert_eq!(removed["changed"], true);
    assert!(
        app.poll("/session", |session| {
            session["profile"]["savedDiseases"] == json!([])
        })
        .await
    );
}

#[tokio::test]
async fn profile_update_only_touches_given_fields() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;

    let response = app
        .json(Method::PATCH, "/profile", json!({ "phone": "0899000111" }))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(
        app.poll("/session", |session| {
            session["profile"]["phone"] == "0899000111"
                && session["profile"]["fullName"] == "Siti Aminah"
        })
        .await
    );
}

#[tokio::test]
async fn scan_returns_a_result_and_records_history() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;

    let response = app
        .send(multipart_upload("daun.png", "image/png", b"\x89PNG fake leaf"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let disease = body["result"]["disease"].as_str().unwrap().to_string();
    assert!(!disease.is_empty());

    assert!(
        app.poll("/scans", |history| {
            history["items"].as_array().map(Vec::len) == Some(1)
                && history["items"][0]["disease"] == disease.as_str()
                && history["items"][0]["imageUrl"]
                    .as_str()
                    .is_some_and(|url| url.starts_with("memory://scans/"))
        })
        .await
    );
}

#[tokio::test]
async fn scan_image_url_survives_awkward_file_names() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;

    let response = app
        .send(multipart_upload("daun sakit #1.jpg", "image/jpeg", b"\xff\xd8 fake leaf"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(
        app.poll("/scans", |history| {
            history["items"][0]["imageUrl"].as_str().is_some_and(|url| {
                url.ends_with("_daun_sakit__1.jpg") && !url.contains([' ', '#'])
            })
        })
        .await
    );
}

#[tokio::test]
async fn scan_rejects_non_images_and_empty_forms() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;

    let response = app
        .send(multipart_upload("catatan.txt", "text/plain", b"bukan gambar"))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body_json(response).await["error"],
        "Mohon upload file gambar (JPG, PNG, etc.)"
    );

    let history = body_json(app.get("/scans").await).await;
    assert_eq!(history["items"], json!([]));
}

#[tokio::test]
async fn federated_sign_in_waits_for_consent() {
    let app = signed_out_app().await;

    let router = app.router.clone();
    let pending = tokio::spawn(async move {
        use tower::ServiceExt;
        let request = axum::http::Request::post("/auth/federated")
            .body(axum::body::Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    });

    assert!(eventually(|| app.state.consent.is_pending()).await);
    let granted = app
        .json(
            Method::POST,
            "/auth/federated/consent",
            json!({ "email": "tamu@gotany.id", "displayName": "Tamu Kebun" }),
        )
        .await;
    assert_eq!(granted.status(), StatusCode::ACCEPTED);

    let response = pending.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "tamu@gotany.id");

    assert!(
        app.poll("/session", |session| {
            session["profile"]["fullName"] == "Tamu Kebun"
        })
        .await
    );
}

#[tokio::test]
async fn dismissed_consent_cancels_federated_sign_in() {
    let app = signed_out_app().await;

    let response = app.empty(Method::DELETE, "/auth/federated/consent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let router = app.router.clone();
    let pending = tokio::spawn(async move {
        use tower::ServiceExt;
        let request = axum::http::Request::post("/auth/federated")
            .body(axum::body::Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    });

    assert!(eventually(|| app.state.consent.is_pending()).await);
    let dismissed = app.empty(Method::DELETE, "/auth/federated/consent").await;
    assert_eq!(dismissed.status(), StatusCode::ACCEPTED);

    let response = pending.await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Login dibatalkan.");

    let session = body_json(app.get("/session").await).await;
    assert_eq!(session["phase"], "unauthenticated");
}
