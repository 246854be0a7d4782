//! Normalization of extracted features into the final recommendation
//! response: truncation, property backfill, and the aggregate improvement
//! score. Never fails.

use serde_json::{json, Map, Value};

use crate::recommend::extract::DEFAULT_REASON;
use crate::recommend::models::{RecommendationRequest, RecommendationResponse};
use crate::recommend::score::ScoreSource;

/// Average per-feature score assumed when the feature list is empty. Keeps
/// the empty-response improvement score at exactly 84.0.
const EMPTY_AVG_SCORE: f64 = 0.8;

/// Truncates to the requested count, backfills missing feature properties,
/// and computes the aggregate improvement score as `60 + 30 * avg(score)`.
pub fn normalize(
    mut features: Vec<Value>,
    request: &RecommendationRequest,
    scores: &dyn ScoreSource,
) -> RecommendationResponse {
    features.truncate(request.recommendations_count);

    for (index, feature) in features.iter_mut().enumerate() {
        backfill_properties(feature, &request.target_facility_type, index, scores);
    }

    let avg_score = if features.is_empty() {
        EMPTY_AVG_SCORE
    } else {
        let total: f64 = features.iter().map(feature_score).sum();
        total / features.len() as f64
    };
    let improvement_score = 60.0 + avg_score * 30.0;

    RecommendationResponse::new(features, improvement_score)
}

fn backfill_properties(
    feature: &mut Value,
    facility_type: &str,
    index: usize,
    scores: &dyn ScoreSource,
) {
    let Some(obj) = feature.as_object_mut() else {
        return;
    };

    if !obj.get("properties").map_or(false, Value::is_object) {
        obj.insert("properties".to_string(), Value::Object(Map::new()));
    }
    // Checked to be an object just above.
    let Some(props) = obj.get_mut("properties").and_then(Value::as_object_mut) else {
        return;
    };

    if !props.contains_key("name") {
        props.insert(
            "name".to_string(),
            Value::String(format!(
                "Recommended site for {} #{}",
                facility_type,
                index + 1
            )),
        );
    }
    if !props.contains_key("type") {
        props.insert(
            "type".to_string(),
            Value::String("recommendation".to_string()),
        );
    }
    if !props.contains_key("reason") {
        props.insert("reason".to_string(), Value::String(DEFAULT_REASON.to_string()));
    }
    if !props.contains_key("score") {
        props.insert("score".to_string(), json!(scores.sample(0.8, 0.95)));
    }
}

fn feature_score(feature: &Value) -> f64 {
    feature
        .pointer("/properties/score")
        .and_then(Value::as_f64)
        .unwrap_or(EMPTY_AVG_SCORE)
}
