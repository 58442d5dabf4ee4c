//! services/api/src/web/rest.rs
//!
//! The session snapshot endpoint and the master definition of the OpenAPI
//! document.

use crate::web::state::AppState;
use crate::web::{auth, catalog, profile, scan};
use crate::error::ErrorBody;
use crate::adapters::FederatedProfile;
use axum::{extract::State, response::Json};
use go_tany_core::domain::{Identity, UserProfile};
use go_tany_core::guard::AuthPhase;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        session_handler,
        auth::login_handler,
        auth::register_handler,
        auth::federated_handler,
        auth::grant_consent_handler,
        auth::dismiss_consent_handler,
        auth::logout_handler,
        auth::password_strength_handler,
        catalog::list_diseases_handler,
        catalog::get_disease_handler,
        catalog::filter_options_handler,
        catalog::remote_diseases_handler,
        scan::scan_handler,
        scan::scan_history_handler,
        profile::save_favorite_handler,
        profile::remove_favorite_handler,
        profile::update_profile_handler,
    ),
    components(
        schemas(
            SessionResponse,
            ErrorBody,
            FederatedProfile,
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::AuthResponse,
            auth::PasswordStrengthRequest,
            auth::PasswordStrengthResponse,
            catalog::DiseaseList,
            catalog::FilterOptions,
            scan::ScanResponse,
            scan::ScanHistory,
            profile::FavoriteResponse,
            profile::ProfileUpdateRequest,
        )
    ),
    tags(
        (name = "GO TANY API", description = "Client shell for the plant disease catalog and scanner.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

/// The current session snapshot.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// `resolving`, `unauthenticated` or `authenticated`.
    pub phase: String,
    pub is_resolving: bool,
    #[schema(value_type = Option<Object>)]
    pub identity: Option<Identity>,
    #[schema(value_type = Option<Object>)]
    pub profile: Option<UserProfile>,
}

fn phase_name(phase: AuthPhase) -> &'static str {
    match phase {
        AuthPhase::Resolving => "resolving",
        AuthPhase::Unauthenticated => "unauthenticated",
        AuthPhase::Authenticated => "authenticated",
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET /session - The current authentication state
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Session snapshot", body = SessionResponse))
)]
pub async fn session_handler(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let snapshot = state.session.state();
    Json(SessionResponse {
        phase: phase_name(snapshot.phase()).to_string(),
        is_resolving: snapshot.is_resolving,
        identity: snapshot.identity,
        profile: snapshot.profile,
    })
}
