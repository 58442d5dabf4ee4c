#![allow(dead_code)]

use api_lib::adapters::{ConsentBroker, MemoryBlobStore, MemoryDocumentStore, MemoryIdentityProvider};
use api_lib::config::Config;
use api_lib::web::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use go_tany_core::analysis::MockPredictor;
use go_tany_core::session::Subscription;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const PASSWORD: &str = "Rahasia123!";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub blobs: Arc<MemoryBlobStore>,
    pub subscription: Option<Subscription>,
}

/// A shell on in-memory collaborators. With `subscribe == false` the session
/// never hears from the provider and stays resolving.
pub fn app(subscribe: bool) -> TestApp {
    let config = Arc::new(Config {
        analysis_delay: Duration::ZERO,
        consent_timeout: Duration::from_secs(5),
        ..Config::default()
    });
    let consent = Arc::new(ConsentBroker::new(config.consent_timeout));
    let blobs = Arc::new(MemoryBlobStore::new());
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(MemoryIdentityProvider::new(consent.clone())),
        Arc::new(MemoryDocumentStore::new()),
        blobs.clone(),
        Arc::new(MockPredictor::new(config.analysis_delay)),
        consent,
    ));
    let subscription = subscribe.then(|| state.session.subscribe());
    TestApp {
        router: build_router(state.clone()),
        state,
        blobs,
        subscription,
    }
}

/// A subscribed shell whose session has resolved to signed-out.
pub async fn signed_out_app() -> TestApp {
    let app = app(true);
    app.state.session.resolved().await;
    app
}

pub fn register_body(email: &str) -> Value {
    json!({
        "firstName": "Siti",
        "lastName": "Aminah",
        "username": "siti",
        "email": email,
        "phone": "081234567890",
        "gender": "perempuan",
        "password": PASSWORD,
        "confirmPassword": PASSWORD,
        "agreeTerms": true
    })
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn json(&self, method: Method, uri: &str, body: Value) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn empty(&self, method: Method, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Polls `GET uri` until its JSON body satisfies `check` or a second has passed.
    pub async fn poll(&self, uri: &str, check: impl Fn(&Value) -> bool) -> bool {
        for _ in 0..100 {
            let response = self.get(uri).await;
            if response.status() == StatusCode::OK && check(&body_json(response).await) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Registers an account, which also signs it in.
    pub async fn register(&self, email: &str) -> Value {
        let response = self
            .json(Method::POST, "/auth/register", register_body(email))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// A multipart form with one file part.
pub fn multipart_upload(file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "go-tany-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/scan")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Polls `check` until it holds or a second has passed.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
