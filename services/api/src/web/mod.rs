pub mod auth;
pub mod catalog;
pub mod middleware;
pub mod profile;
pub mod rest;
pub mod scan;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use go_tany_core::analysis::MAX_IMAGE_BYTES;
use std::sync::Arc;

pub use middleware::{require_auth, require_signed_out};
pub use rest::{session_handler, ApiDoc};
pub use state::AppState;

/// Room above the image limit so oversized images still reach validation.
const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 2 * 1024 * 1024;

/// Builds the API router with its route guards. CORS, static files and the
/// Swagger UI are layered on by the binary.
pub fn build_router(state: Arc<AppState>) -> Router {
    // No guard
    let open_routes = Router::new()
        .route("/session", get(session_handler))
        .route(
            "/auth/federated/consent",
            post(auth::grant_consent_handler).delete(auth::dismiss_consent_handler),
        )
        .route("/auth/password-strength", post(auth::password_strength_handler));

    // Signed-out sessions only
    let public_only_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/federated", post(auth::federated_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_signed_out,
        ));

    // Signed-in sessions only
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/diseases", get(catalog::list_diseases_handler))
        .route("/diseases/filters", get(catalog::filter_options_handler))
        .route("/diseases/remote", get(catalog::remote_diseases_handler))
        .route("/diseases/{id}", get(catalog::get_disease_handler))
        .route("/scan", post(scan::scan_handler))
        .route("/scans", get(scan::scan_history_handler))
        .route(
            "/favorites/{id}",
            post(profile::save_favorite_handler).delete(profile::remove_favorite_handler),
        )
        .route("/profile", axum::routing::patch(profile::update_profile_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(open_routes)
        .merge(public_only_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
