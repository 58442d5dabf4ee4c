//! services/api/src/web/catalog.rs
//!
//! Read-only catalog endpoints. `/diseases` and `/diseases/{id}` serve the bundled
//! catalog; `/diseases/remote` serves the document store collection.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use go_tany_core::catalog::{catalog, get_disease_by_param};
use go_tany_core::domain::DiseaseRecord;
use go_tany_core::filter::{disease_type_options, filter, plant_options, FilterCriteria, ALL_PLANTS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct DiseaseList {
    pub total: usize,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<DiseaseRecord>,
}

impl DiseaseList {
    fn new(items: Vec<DiseaseRecord>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// The plant filter value that selects every plant.
    pub all_plants: String,
    pub plants: Vec<String>,
    pub disease_types: Vec<String>,
}

#[derive(Deserialize, Default)]
pub struct RemoteQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub disease_type: Option<String>,
    pub plant: Option<String>,
}

/// GET /diseases - Filter the bundled catalog
#[utoipa::path(
    get,
    path = "/diseases",
    params(
        ("searchTerm" = Option<String>, Query, description = "Case-insensitive match on title, plant or type"),
        ("plantFilter" = Option<String>, Query, description = "Exact plant, or \"Semua Buah\" for all"),
        ("diseaseFilter" = Option<String>, Query, description = "Exact disease type")
    ),
    responses(
        (status = 200, description = "Matching entries in catalog order", body = DiseaseList),
        (status = 303, description = "Not signed in"),
        (status = 503, description = "Session still resolving")
    )
)]
pub async fn list_diseases_handler(Query(criteria): Query<FilterCriteria>) -> Json<DiseaseList> {
    let items = filter(catalog(), &criteria).into_iter().cloned().collect();
    Json(DiseaseList::new(items))
}

/// GET /diseases/{id} - One entry of the bundled catalog
#[utoipa::path(
    get,
    path = "/diseases/{id}",
    params(("id" = String, Path, description = "Catalog id")),
    responses(
        (status = 200, description = "The entry"),
        (status = 404, description = "No entry with this id", body = ErrorBody)
    )
)]
pub async fn get_disease_handler(Path(id): Path<String>) -> Result<Json<DiseaseRecord>, ApiError> {
    get_disease_by_param(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Penyakit tidak ditemukan".to_string()))
}

/// GET /diseases/filters - Distinct plant and type values of the bundled catalog
#[utoipa::path(
    get,
    path = "/diseases/filters",
    responses((status = 200, description = "Filter options", body = FilterOptions))
)]
pub async fn filter_options_handler() -> Json<FilterOptions> {
    Json(FilterOptions {
        all_plants: ALL_PLANTS.to_string(),
        plants: plant_options(catalog()),
        disease_types: disease_type_options(catalog()),
    })
}

/// GET /diseases/remote - Read the remote disease collection
///
/// At most one of `search`, `type` and `plant` applies, in that order.
#[utoipa::path(
    get,
    path = "/diseases/remote",
    params(
        ("search" = Option<String>, Query, description = "Substring match on title, plant or type"),
        ("type" = Option<String>, Query, description = "Exact disease type"),
        ("plant" = Option<String>, Query, description = "Exact plant")
    ),
    responses(
        (status = 200, description = "Entries ordered by title", body = DiseaseList),
        (status = 500, description = "Document store unavailable", body = ErrorBody)
    )
)]
pub async fn remote_diseases_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RemoteQuery>,
) -> Result<Json<DiseaseList>, ApiError> {
    let items = match (query.search, query.disease_type, query.plant) {
        (Some(term), _, _) => state.remote.search(&term).await?,
        (None, Some(disease_type), _) => state.remote.by_type(&disease_type).await?,
        (None, None, Some(plant)) => state.remote.by_plant(&plant).await?,
        (None, None, None) => state.remote.all().await?,
    };
    Ok(Json(DiseaseList::new(items)))
}
