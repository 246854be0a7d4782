use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::facilities::store;
use crate::models::facility::{FacilityCreate, FacilityFilter, FacilityRecord};
use crate::recommend::constants::FACILITY_TYPES;
use crate::state::AppState;

/// POST /facilities/
pub async fn handle_create_facility(
    State(state): State<AppState>,
    Json(req): Json<FacilityCreate>,
) -> Result<Json<FacilityRecord>, AppError> {
    let record = store::insert(&state.db, &req).await?;
    Ok(Json(record))
}

/// GET /facilities/
pub async fn handle_list_facilities(
    State(state): State<AppState>,
    Query(filter): Query<FacilityFilter>,
) -> Result<Json<Vec<FacilityRecord>>, AppError> {
    let records = store::query(&state.db, &filter).await?;
    Ok(Json(records))
}

/// GET /facilities/:id
pub async fn handle_get_facility(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FacilityRecord>, AppError> {
    let record = store::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Facility {id} not found")))?;
    Ok(Json(record))
}

/// GET /facilities/type/:facility_type
/// Per-type listing with optional bounding-box filters from the query string.
pub async fn handle_list_facilities_by_type(
    State(state): State<AppState>,
    Path(facility_type): Path<String>,
    Query(mut filter): Query<FacilityFilter>,
) -> Result<Json<Vec<FacilityRecord>>, AppError> {
    filter.facility_type = Some(facility_type);
    let records = store::query(&state.db, &filter).await?;
    Ok(Json(records))
}

/// GET /facility-types
/// Known facility types with display names and nominal coverage radii.
pub async fn handle_facility_types() -> Json<Value> {
    let types: Vec<Value> = FACILITY_TYPES
        .iter()
        .map(|info| {
            json!({
                "type": info.tag,
                "name": info.name,
                "coverage_radius_km": info.coverage_radius_km
            })
        })
        .collect();
    Json(json!({ "facility_types": types }))
}
