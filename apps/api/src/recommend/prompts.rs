//! Prompt assembly for the placement-recommendation call.
//!
//! Pure functions, no I/O. The system prompt carries the hard constraints
//! (boundary containment, spacing, priority regions, output shape); the user
//! prompt carries the request-specific data.

use serde_json::{json, Value};

use crate::recommend::constants::{
    coverage_radius_km, BOUNDARY_MARGIN_DEG, CITY_BOUNDARY, DEFAULT_COVERAGE_RADIUS_M,
    MIN_SPACING_M, PRIORITY_MIN_FRACTION, PRIORITY_REGIONS,
};
use crate::recommend::models::RecommendationRequest;

fn boundary_json() -> String {
    let vertices: Vec<Value> = CITY_BOUNDARY
        .iter()
        .map(|[lon, lat]| json!([lon, lat]))
        .collect();
    serde_json::to_string(&vertices).unwrap_or_default()
}

fn priority_regions_text() -> String {
    PRIORITY_REGIONS
        .iter()
        .map(|r| {
            format!(
                "- {}: longitude {} to {}, latitude {} to {}",
                r.name, r.west, r.east, r.south, r.north
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the system prompt. Embeds the full city boundary polygon and the
/// placement rules as literal text.
pub fn build_system_prompt() -> String {
    format!(
        r#"You are an expert in infrastructure planning and geographic optimization.

Your task is to analyze the provided geospatial data, including:
- Locations of existing facilities
- The geographic boundary of the city of Bishkek

The official boundary of Bishkek is the following polygon of [longitude, latitude] vertices:
{boundary}

You MUST strictly follow these instructions:
1. Recommend only locations that fall strictly inside the boundary polygon above, keeping a safety margin of at least {margin} degrees from every edge.
2. Provide exact geographic coordinates for each recommended location in the format: [longitude, latitude].
3. Keep every pair of recommended locations at least {spacing} meters apart.
4. At least {priority_pct}% of the recommendations must fall inside these priority areas:
{priority_regions}
5. Base each recommendation on coverage analysis: avoid areas already well covered and prioritize underserved zones.
6. Aim for balanced and efficient distribution across the entire city.
7. Return your response as a single valid GeoJSON object only. No explanations, no markdown, no prose outside the object.

The final output must be a properly formatted GeoJSON FeatureCollection, for example:

{{
  "type": "FeatureCollection",
  "features": [
    {{
      "type": "Feature",
      "geometry": {{
        "type": "Point",
        "coordinates": [longitude, latitude]
      }},
      "properties": {{
        "name": "Recommended Location 1",
        "type": "recommendation",
        "reason": "Justification for this location based on coverage gap or spatial need"
      }}
    }}
  ]
}}"#,
        boundary = boundary_json(),
        margin = BOUNDARY_MARGIN_DEG,
        spacing = MIN_SPACING_M,
        priority_pct = (PRIORITY_MIN_FRACTION * 100.0).round() as u32,
        priority_regions = priority_regions_text(),
    )
}

/// Builds the user prompt from the request: area bounds, existing facilities
/// (coverage radius defaulted when absent), requested count, and target type.
pub fn build_user_prompt(request: &RecommendationRequest) -> String {
    let count = request.recommendations_count;
    let facility_type = &request.target_facility_type;

    let bounds_text = match &request.area_information {
        Some(info) => serde_json::to_string_pretty(&info.bounds).unwrap_or_default(),
        None => "Not provided".to_string(),
    };

    let facilities: Vec<Value> = request
        .existing_facilities
        .iter()
        .map(|f| {
            json!({
                "type": f.facility_type,
                "coordinates": f.coordinates,
                "coverage_radius_m": f.coverage_radius.unwrap_or(DEFAULT_COVERAGE_RADIUS_M),
            })
        })
        .collect();
    let facilities_text = serde_json::to_string_pretty(&facilities).unwrap_or_default();

    let radius_text = match coverage_radius_km(facility_type) {
        Some(km) => format!("A {facility_type} nominally serves a radius of about {km} km."),
        None => String::new(),
    };

    format!(
        r#"I need recommendations for optimal placement of {count} new {facility_type} facilities in Bishkek.
{radius_text}

The city boundary polygon ([longitude, latitude] vertices):
{boundary}

Area boundaries of interest:
{bounds_text}

There are {existing_count} existing facilities in the area with the following details:
{facilities_text}

Please analyze this information and recommend {count} optimal locations for new {facility_type} facilities.
Your response must be a valid GeoJSON object with type "FeatureCollection" containing {count} "Feature" objects.
Each feature must have "Point" geometry with coordinates [longitude, latitude] and properties including "name", "type": "recommendation", and "reason" explaining why this location is recommended."#,
        boundary = boundary_json(),
        existing_count = request.existing_facilities.len(),
    )
}
