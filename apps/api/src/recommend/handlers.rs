use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::facilities::store;
use crate::models::facility::FacilityFilter;
use crate::recommend::extract::extract_features;
use crate::recommend::models::{FacilityData, RecommendationRequest, RecommendationResponse};
use crate::recommend::normalize::normalize;
use crate::recommend::prompts::{build_system_prompt, build_user_prompt};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    /// Accepted for caller compatibility; the generation path is always
    /// taken (the local branch was never reachable).
    #[serde(default)]
    pub use_openai: Option<bool>,
}

/// POST /ai/recommend
pub async fn handle_recommend(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
    Json(mut request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, AppError> {
    if request.recommendations_count == 0 {
        return Err(AppError::Validation(
            "recommendations_count must be at least 1".to_string(),
        ));
    }
    if let Some(info) = &request.area_information {
        info.bounds.validate().map_err(AppError::Validation)?;
    }

    // When the caller supplied no facility context, load it from the store
    // using the planning rectangle.
    if request.existing_facilities.is_empty() {
        if let Some(info) = &request.area_information {
            let filter = FacilityFilter {
                min_lat: Some(info.bounds.south),
                max_lat: Some(info.bounds.north),
                min_lon: Some(info.bounds.west),
                max_lon: Some(info.bounds.east),
                ..FacilityFilter::default()
            };
            let records = store::query(&state.db, &filter).await?;
            request.existing_facilities = records.into_iter().map(FacilityData::from).collect();
        }
    }

    info!(
        target_type = %request.target_facility_type,
        count = request.recommendations_count,
        existing = request.existing_facilities.len(),
        use_openai = ?query.use_openai,
        "Received recommendation request"
    );

    let system_prompt = build_system_prompt();
    let user_prompt = build_user_prompt(&request);

    let response_text = state
        .generation
        .complete(&system_prompt, &user_prompt)
        .await?;
    debug!("Generation response preview: {}", preview(&response_text, 500));

    let features = extract_features(&response_text, state.scores.as_ref());
    let response = normalize(features, &request, state.scores.as_ref());

    info!(
        features = response.features.len(),
        improvement_score = response.improvement_score,
        "Recommendation response ready"
    );
    Ok(Json(response))
}

/// First `limit` bytes of `text`, clamped to a character boundary.
fn preview(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("hello", 500), "hello");
    }

    #[test]
    fn test_preview_truncates_at_char_boundary() {
        let text = "координаты".repeat(100);
        let cut = preview(&text, 501);
        assert!(cut.len() <= 501);
        assert!(text.starts_with(cut));
    }

    #[test]
    fn test_recommend_query_defaults() {
        let query: RecommendQuery = serde_urlencoded::from_str("").unwrap();
        assert!(query.use_openai.is_none());
        let query: RecommendQuery = serde_urlencoded::from_str("use_openai=true").unwrap();
        assert_eq!(query.use_openai, Some(true));
    }
}
