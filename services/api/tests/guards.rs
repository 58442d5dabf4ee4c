mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn protected_routes_answer_loading_while_resolving() {
    let app = app(false);

    let response = app.get("/diseases").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await, json!({ "status": "loading" }));
}

#[tokio::test]
async fn public_only_routes_render_nothing_while_resolving() {
    let app = app(false);

    let response = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "a@b.co", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn session_reports_resolving_until_the_provider_answers() {
    let app = app(false);
    let body = body_json(app.get("/session").await).await;
    assert_eq!(body["phase"], "resolving");
    assert_eq!(body["isResolving"], true);

    let app = signed_out_app().await;
    let body = body_json(app.get("/session").await).await;
    assert_eq!(body["phase"], "unauthenticated");
    assert_eq!(body["isResolving"], false);
    assert!(body["identity"].is_null());
}

#[tokio::test]
async fn signed_out_visitors_are_sent_to_login() {
    let app = signed_out_app().await;

    for uri in ["/diseases", "/diseases/1", "/scans"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login");
    }
}

#[tokio::test]
async fn signed_in_users_are_sent_away_from_login_and_register() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;

    let response = app
        .json(Method::POST, "/auth/register", register_body("lain@gotany.id"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/beranda");

    let response = app
        .json(
            Method::POST,
            "/auth/login",
            json!({ "email": "petani@gotany.id", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/beranda");
}

#[tokio::test]
async fn logout_closes_protected_routes_again() {
    let app = signed_out_app().await;
    app.register("petani@gotany.id").await;
    assert_eq!(app.get("/diseases").await.status(), StatusCode::OK);

    let response = app.empty(Method::POST, "/auth/logout").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/diseases").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn password_strength_needs_no_session() {
    let app = app(false);

    let response = app
        .json(
            Method::POST,
            "/auth/password-strength",
            json!({ "password": "Rahasia123!" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["strength"], "strong");
    assert_eq!(body["label"], "Kuat");
}
