//! services/api/src/web/middleware.rs
//!
//! Route guards for the HTTP surface. Both read the current session snapshot.
//!
//! - resolving: protected routes answer `503 {"status":"loading"}`, public-only
//!   routes answer `204` with no body
//! - redirect: `303 See Other` with a `Location` from the route table
//!
//! The protected guard inserts the signed-in [`Identity`] into request extensions
//! for handlers to use.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use go_tany_core::domain::Identity;
use go_tany_core::guard::{GuardDecision, GuardKind};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::web::state::AppState;

/// `Ok` when the guard renders the route, otherwise the response that replaces it.
fn admit(decision: GuardDecision) -> Result<(), Response> {
    match decision {
        GuardDecision::Render => Ok(()),
        GuardDecision::Loading => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "loading" })),
        )
            .into_response()),
        GuardDecision::Blank => Err(StatusCode::NO_CONTENT.into_response()),
        GuardDecision::Redirect(route) => Err(Redirect::to(&route.to_path()).into_response()),
    }
}

/// Lets only signed-in sessions through.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let snapshot = state.session.state();
    match admit(GuardKind::Protected.decide(snapshot.phase())) {
        Ok(()) => {
            if let Some(identity) = snapshot.identity {
                req.extensions_mut().insert::<Identity>(identity);
            }
            next.run(req).await
        }
        Err(refused) => {
            debug!(path = %req.uri().path(), status = %refused.status(), "Protected route refused.");
            refused
        }
    }
}

/// Lets only signed-out sessions through.
pub async fn require_signed_out(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    match admit(GuardKind::PublicOnly.decide(state.session.state().phase())) {
        Ok(()) => next.run(req).await,
        Err(refused) => {
            debug!(path = %req.uri().path(), status = %refused.status(), "Public-only route refused.");
            refused
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;
    use go_tany_core::route::Route;

    #[test]
    fn render_admits_and_everything_else_answers() {
        assert!(admit(GuardDecision::Render).is_ok());

        let loading = admit(GuardDecision::Loading).unwrap_err();
        assert_eq!(loading.status(), StatusCode::SERVICE_UNAVAILABLE);

        let blank = admit(GuardDecision::Blank).unwrap_err();
        assert_eq!(blank.status(), StatusCode::NO_CONTENT);

        let redirect = admit(GuardDecision::Redirect(Route::Login)).unwrap_err();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect.headers()[LOCATION], Route::Login.to_path().as_str());
    }
}
