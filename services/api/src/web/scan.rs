//! services/api/src/web/scan.rs
//!
//! The scan endpoints: run an analysis on an uploaded leaf image, and read the
//! signed-in user's scan history.

use axum::{
    extract::{Multipart, Query, State},
    Extension, Json,
};
use go_tany_core::domain::{AnalysisResult, Identity, ImageFile, ScanRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    #[schema(value_type = Object)]
    pub result: AnalysisResult,
}

#[derive(Serialize, ToSchema)]
pub struct ScanHistory {
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<ScanRecord>,
}

#[derive(Deserialize, Default)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Reads the first file part of the form.
async fn read_image(multipart: &mut Multipart) -> Result<ImageFile, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        return Ok(ImageFile::new(file_name, content_type, bytes));
    }
    Err(ApiError::BadRequest("Pilih gambar terlebih dahulu".to_string()))
}

/// POST /scan - Analyze one leaf image
///
/// The image is uploaded and the result recorded in the background; neither
/// affects the response.
#[utoipa::path(
    post,
    path = "/scan",
    request_body(content_type = "multipart/form-data", description = "One image file."),
    responses(
        (status = 200, description = "Detection result", body = ScanResponse),
        (status = 400, description = "No file in the form", body = ErrorBody),
        (status = 413, description = "Image larger than 10 MB", body = ErrorBody),
        (status = 415, description = "Not an image", body = ErrorBody),
        (status = 500, description = "Analysis failed", body = ErrorBody)
    )
)]
pub async fn scan_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<Json<ScanResponse>, ApiError> {
    let image = read_image(&mut multipart).await?;
    info!(uid = %identity.uid, file = %image.file_name, size = image.size(), "Scan requested.");

    let result = state.analyzer.run(image, Some(&identity)).await?;
    Ok(Json(ScanResponse { result }))
}

/// GET /scans - The signed-in user's most recent scans
#[utoipa::path(
    get,
    path = "/scans",
    params(("limit" = Option<usize>, Query, description = "Defaults to 10")),
    responses(
        (status = 200, description = "Newest first", body = ScanHistory),
        (status = 500, description = "Document store unavailable", body = ErrorBody)
    )
)]
pub async fn scan_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ScanHistory>, ApiError> {
    let items = state.profiles.scan_history(identity.uid, query.limit).await?;
    Ok(Json(ScanHistory { items }))
}
