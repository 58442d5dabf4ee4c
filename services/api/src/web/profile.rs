//! services/api/src/web/profile.rs
//!
//! Favorites and profile edits. Both re-read the session profile afterwards.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use go_tany_core::domain::{DiseaseId, Identity, ProfileUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub disease_id: u32,
    /// Whether the saved set changed. Failures are logged and reported as `false`.
    pub changed: bool,
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
}

impl From<ProfileUpdateRequest> for ProfileUpdate {
    fn from(req: ProfileUpdateRequest) -> Self {
        ProfileUpdate {
            full_name: req.full_name,
            phone: req.phone,
            photo_url: req.photo_url,
        }
    }
}

/// POST /favorites/{id} - Save a disease
#[utoipa::path(
    post,
    path = "/favorites/{id}",
    params(("id" = u32, Path, description = "Catalog id")),
    responses((status = 200, description = "Best-effort result", body = FavoriteResponse))
)]
pub async fn save_favorite_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(disease_id): Path<DiseaseId>,
) -> Json<FavoriteResponse> {
    let changed = state.profiles.save_favorite(identity.uid, disease_id).await;
    if changed {
        state.session.refresh_profile();
    }
    Json(FavoriteResponse { disease_id, changed })
}

/// DELETE /favorites/{id} - Forget a saved disease
#[utoipa::path(
    delete,
    path = "/favorites/{id}",
    params(("id" = u32, Path, description = "Catalog id")),
    responses((status = 200, description = "Best-effort result", body = FavoriteResponse))
)]
pub async fn remove_favorite_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(disease_id): Path<DiseaseId>,
) -> Json<FavoriteResponse> {
    let changed = state.profiles.remove_favorite(identity.uid, disease_id).await;
    if changed {
        state.session.refresh_profile();
    }
    Json(FavoriteResponse { disease_id, changed })
}

/// PATCH /profile - Update selected profile fields
#[utoipa::path(
    patch,
    path = "/profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 204, description = "Profile updated"),
        (status = 404, description = "No profile document", body = ErrorBody)
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .profiles
        .update_profile(identity.uid, ProfileUpdate::from(req))
        .await?;
    state.session.refresh_profile();
    Ok(StatusCode::NO_CONTENT)
}
