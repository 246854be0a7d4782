use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::models::facility::FacilityRecord;
use crate::recommend::constants::DEFAULT_COVERAGE_RADIUS_M;

/// An existing facility as presented to the planning model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityData {
    #[serde(rename = "type")]
    pub facility_type: String,
    /// `[longitude, latitude]` in WGS-84 degrees.
    pub coordinates: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Nominal service radius in meters. Prompts substitute
    /// `DEFAULT_COVERAGE_RADIUS_M` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_radius: Option<f64>,
}

impl From<FacilityRecord> for FacilityData {
    fn from(record: FacilityRecord) -> Self {
        FacilityData {
            facility_type: record.facility_type,
            coordinates: vec![record.longitude, record.latitude],
            name: Some(record.name),
            coverage_radius: Some(DEFAULT_COVERAGE_RADIUS_M),
        }
    }
}

/// Planning rectangle in WGS-84 degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AreaBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl AreaBounds {
    pub fn validate(&self) -> Result<(), String> {
        if self.south > self.north {
            return Err(format!(
                "south ({}) must not exceed north ({})",
                self.south, self.north
            ));
        }
        if self.west > self.east {
            return Err(format!(
                "west ({}) must not exceed east ({})",
                self.west, self.east
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaInformation {
    pub bounds: AreaBounds,
    #[serde(default)]
    pub center: Map<String, Value>,
    #[serde(default)]
    pub area_size_km2: f64,
}

fn default_count() -> usize {
    5
}

fn default_request_type() -> String {
    "optimal_placement".to_string()
}

/// Body of `POST /ai/recommend`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub existing_facilities: Vec<FacilityData>,
    #[serde(default)]
    pub area_information: Option<AreaInformation>,
    /// Facility-type metadata supplied by the caller; passed through to the
    /// prompt uninterpreted.
    #[serde(default)]
    pub facility_types: Vec<Value>,
    pub target_facility_type: String,
    #[serde(default = "default_count")]
    pub recommendations_count: usize,
    #[serde(default = "default_request_type")]
    pub request_type: String,
}

/// GeoJSON-shaped response of `POST /ai/recommend`.
///
/// Features are carried as raw JSON values so that feature objects produced
/// by the model pass through unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Value>,
    pub improvement_score: f64,
}

impl RecommendationResponse {
    pub fn new(features: Vec<Value>, improvement_score: f64) -> Self {
        RecommendationResponse {
            kind: "FeatureCollection",
            features,
            improvement_score,
        }
    }
}

/// Builds a GeoJSON Point feature from a coordinate pair and properties.
pub fn point_feature(lon: f64, lat: f64, properties: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [lon, lat]
        },
        "properties": properties
    })
}
