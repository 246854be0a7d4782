//! Response extraction — turns the raw generation text into GeoJSON point
//! features, tolerating format drift.
//!
//! Strategies are pure `text -> Option<Vec<Value>>` functions tried in order
//! of confidence; the first one that produces features wins. Extraction never
//! fails: malformed input degrades to fewer or zero features.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::recommend::models::point_feature;
use crate::recommend::score::ScoreSource;

/// Default justification attached to text-mined coordinates.
pub const DEFAULT_REASON: &str = "Optimal placement according to model analysis";

/// Number of bytes of context inspected on each side of a mined coordinate
/// pair when looking for a nearby name or justification.
const CONTEXT_WINDOW: usize = 100;

/// Runs the extraction cascade. Returns an empty list when no strategy finds
/// anything usable.
pub fn extract_features(text: &str, scores: &dyn ScoreSource) -> Vec<Value> {
    scan_structured_blocks(text)
        .or_else(|| parse_whole_text(text))
        .or_else(|| mine_coordinate_pairs(text, scores))
        .unwrap_or_default()
}

/// Fenced/structured block patterns, in priority order: a block labeled as
/// JSON, any fenced block, an inline backticked object, a loose object
/// containing a "features" key.
fn block_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"```json\s*([\s\S]*?)\s*```",
            r"```\s*([\s\S]*?)\s*```",
            r"`(\{[\s\S]*?\})`",
            r#"(\{[\s\S]*?"features"[\s\S]*?\})"#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("block pattern must compile"))
        .collect()
    })
}

/// Strategy 1: scan for embedded structured blocks and parse each candidate.
fn scan_structured_blocks(text: &str) -> Option<Vec<Value>> {
    for pattern in block_patterns() {
        for caps in pattern.captures_iter(text) {
            let candidate = match caps.get(1) {
                Some(m) => m.as_str().trim(),
                None => continue,
            };
            if !(candidate.starts_with('{') || candidate.starts_with('[')) {
                continue;
            }
            let parsed: Value = match serde_json::from_str(candidate) {
                Ok(value) => value,
                Err(_) => continue,
            };
            if let Some(features) = features_from_value(parsed) {
                return Some(features);
            }
        }
    }
    None
}

/// Strategy 2: parse the entire trimmed text as one JSON document; accept it
/// only if it is an object carrying a "features" array.
fn parse_whole_text(text: &str) -> Option<Vec<Value>> {
    let parsed: Value = serde_json::from_str(text.trim()).ok()?;
    match parsed {
        Value::Object(mut obj) => match obj.remove("features") {
            Some(Value::Array(features)) => Some(features),
            _ => None,
        },
        _ => None,
    }
}

/// Converts a parsed candidate into a feature list.
///
/// An object with a "features" array is taken directly, even when the array
/// is empty (the model explicitly returned an empty collection). An array is
/// converted record by record; it counts only if at least one record is
/// point-like.
fn features_from_value(parsed: Value) -> Option<Vec<Value>> {
    match parsed {
        Value::Object(mut obj) => match obj.remove("features") {
            Some(Value::Array(features)) => Some(features),
            _ => None,
        },
        Value::Array(items) => {
            let features: Vec<Value> = items.into_iter().filter_map(feature_from_point).collect();
            (!features.is_empty()).then_some(features)
        }
        _ => None,
    }
}

/// Converts one point-like record into a Point feature by recognizing, in
/// order: `{lat, lon}`, `{latitude, longitude}`, `{coordinates: [...]}`, or
/// an already-feature-shaped record with nested geometry coordinates (passed
/// through unchanged). Anything else is skipped.
fn feature_from_point(item: Value) -> Option<Value> {
    let Value::Object(mut obj) = item else {
        return None;
    };

    let coordinates: Value = if let (Some(lat), Some(lon)) = (
        obj.get("lat").and_then(coordinate_number),
        obj.get("lon").and_then(coordinate_number),
    ) {
        obj.remove("lat");
        obj.remove("lon");
        json!([lon, lat])
    } else if let (Some(lat), Some(lon)) = (
        obj.get("latitude").and_then(coordinate_number),
        obj.get("longitude").and_then(coordinate_number),
    ) {
        obj.remove("latitude");
        obj.remove("longitude");
        json!([lon, lat])
    } else if matches!(obj.get("coordinates"), Some(Value::Array(_))) {
        obj.remove("coordinates")?
    } else if obj
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .is_some()
    {
        return Some(Value::Object(obj));
    } else {
        return None;
    };

    Some(json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": coordinates
        },
        "properties": Value::Object(obj)
    }))
}

/// Accepts JSON numbers and numeric strings ("42.87") as coordinate values.
fn coordinate_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coordinate-pair text patterns, in order: bracketed `[lon, lat]`, loosely
/// labeled `coordinates/location: lon, lat`, explicitly labeled
/// `longitude ..., latitude ...`. The longitude value comes first in every
/// pattern.
fn pair_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\[\s*(-?\d+\.\d+)\s*,\s*(-?\d+\.\d+)\s*\]",
            r"(?:координаты|coordinates|location)?\s*[-–:]?\s*(-?\d+\.\d+)\s*[,;]\s*(-?\d+\.\d+)",
            r"(?:долгота|longitude)\s*[-–:]?\s*(-?\d+\.\d+)[\s\S]{1,30}(?:широта|latitude)\s*[-–:]?\s*(-?\d+\.\d+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("pair pattern must compile"))
        .collect()
    })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:location|место|локация|точка)\s*(\d+|[\w][\w ]{0,40})")
            .expect("name pattern must compile")
    })
}

fn reason_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:reason|justification|причина|обоснование):\s*([^\n.]*)")
            .expect("reason pattern must compile")
    })
}

/// Strategy 3: mine raw text for coordinate pairs. Pairs are validated
/// against WGS-84 ranges and deduplicated on the pair rounded to 5 decimal
/// places; matches accumulate across all patterns.
fn mine_coordinate_pairs(text: &str, scores: &dyn ScoreSource) -> Option<Vec<Value>> {
    let mut features: Vec<Value> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for pattern in pair_patterns() {
        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some(lon_match), Some(lat_match)) =
                (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let (Ok(lon), Ok(lat)) = (
                lon_match.as_str().parse::<f64>(),
                lat_match.as_str().parse::<f64>(),
            ) else {
                continue;
            };

            if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
                continue;
            }
            let key = format!("{lon:.5},{lat:.5}");
            if !seen.insert(key) {
                continue;
            }

            let context = surrounding_context(text, whole.start(), whole.end());
            let name = name_pattern()
                .captures(&context)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Recommended location {}", features.len() + 1));
            let reason = reason_pattern()
                .captures(&context)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_REASON.to_string());

            let mut properties = Map::new();
            properties.insert("name".to_string(), Value::String(name));
            properties.insert(
                "type".to_string(),
                Value::String("recommendation".to_string()),
            );
            properties.insert("reason".to_string(), Value::String(reason));
            properties.insert("score".to_string(), json!(scores.sample(0.85, 0.95)));

            features.push(point_feature(lon, lat, Value::Object(properties)));
        }
    }

    (!features.is_empty()).then_some(features)
}

/// Concatenated text window immediately before and after a match, clamped to
/// UTF-8 character boundaries.
fn surrounding_context(text: &str, start: usize, end: usize) -> String {
    let before_start = floor_char_boundary(text, start.saturating_sub(CONTEXT_WINDOW));
    let after_end = floor_char_boundary(text, (end + CONTEXT_WINDOW).min(text.len()));
    format!("{}{}", &text[before_start..start], &text[end..after_end])
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::score::FixedScores;

    const SCORES: FixedScores = FixedScores(0.9);

    const FENCED_GEOJSON: &str = r#"Here are my recommendations:

```json
{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [74.61, 42.85]},
     "properties": {"name": "Location A", "type": "recommendation", "reason": "coverage gap"}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [74.55, 42.88]},
     "properties": {"name": "Location B", "type": "recommendation", "reason": "underserved area"}}
  ]
}
```

I hope these help!"#;

    #[test]
    fn test_fenced_feature_collection_returned_verbatim_in_order() {
        let features = extract_features(FENCED_GEOJSON, &SCORES);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["name"], "Location A");
        assert_eq!(features[1]["properties"]["name"], "Location B");
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.61);
    }

    #[test]
    fn test_unlabeled_fence_is_accepted() {
        let text = "```\n{\"features\": [{\"type\": \"Feature\", \"geometry\": {\"type\": \"Point\", \"coordinates\": [74.6, 42.86]}, \"properties\": {}}]}\n```";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn test_loose_flat_object_with_features_key() {
        let text = "Sure! {\"type\": \"FeatureCollection\", \"features\": [], \"note\": \"saturated\"} Nothing near [74.61, 42.85] qualifies.";
        let features = extract_features(text, &SCORES);
        // Accepted directly as the (empty) result; mining never runs.
        assert!(features.is_empty());
    }

    #[test]
    fn test_prose_wrapped_nested_object_rescued_by_mining() {
        // The lazy loose-object pattern cannot balance nested braces, so the
        // cascade falls through to coordinate mining.
        let text = "Sure! {\"type\": \"FeatureCollection\", \"features\": [{\"type\": \"Feature\", \"geometry\": {\"type\": \"Point\", \"coordinates\": [74.62, 42.84]}, \"properties\": {\"name\": \"X\"}}]} Done.";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.62);
    }

    #[test]
    fn test_list_of_latitude_longitude_objects() {
        let text = r#"```json
[
  {"latitude": 42.85, "longitude": 74.61, "name": "North site"},
  {"latitude": 42.88, "longitude": 74.55, "name": "West site"}
]
```"#;
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 2);
        // Coordinates are [longitude, latitude].
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.61);
        assert_eq!(features[0]["geometry"]["coordinates"][1], 42.85);
        // Remaining fields become properties.
        assert_eq!(features[0]["properties"]["name"], "North site");
        assert!(features[0]["properties"].get("latitude").is_none());
    }

    #[test]
    fn test_list_of_lat_lon_objects() {
        let text = "```json\n[{\"lat\": 42.81, \"lon\": 74.59}]\n```";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.59);
        assert_eq!(features[0]["geometry"]["coordinates"][1], 42.81);
    }

    #[test]
    fn test_list_with_coordinates_array_passes_values_through() {
        let text = "```json\n[{\"coordinates\": [74.63, 42.83], \"name\": \"Site\"}]\n```";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"][1], 42.83);
    }

    #[test]
    fn test_list_with_feature_shaped_record_passes_through_unchanged() {
        let text = r#"```json
[{"type": "Feature", "geometry": {"type": "Point", "coordinates": [74.60, 42.87]}, "properties": {"name": "Kept"}}]
```"#;
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["name"], "Kept");
    }

    #[test]
    fn test_list_with_unrecognized_records_skips_them() {
        let text = "```json\n[{\"lat\": 42.81, \"lon\": 74.59}, {\"foo\": 1}]\n```";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn test_whole_text_parse() {
        let text = r#"
        {"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [74.58, 42.89]}, "properties": {}}
        ]}
        "#;
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn test_explicit_empty_collection_stays_empty() {
        // The model deliberately returned no features; mining must not kick in
        // on stray numbers elsewhere in the reply.
        let text = "```json\n{\"type\": \"FeatureCollection\", \"features\": []}\n```\nNo sites within [74.61, 42.85] qualify.";
        let features = extract_features(text, &SCORES);
        assert!(features.is_empty());
    }

    #[test]
    fn test_bracketed_pairs_are_mined() {
        let text = "Best sites: [74.6145, 42.8345], then [74.5521, 42.8712] and finally [74.6030, 42.9011].";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 3);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.6145);
        assert_eq!(features[0]["properties"]["type"], "recommendation");
        assert_eq!(features[0]["properties"]["score"], 0.9);
        assert_eq!(features[2]["properties"]["name"], "Recommended location 3");
    }

    #[test]
    fn test_duplicate_pairs_collapse() {
        let text = "[74.6145, 42.8345] is great. I repeat: [74.6145, 42.8345].";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn test_near_duplicate_within_rounding_tolerance_collapses() {
        let text = "[74.614500, 42.834500] and [74.614501, 42.834499]";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn test_out_of_range_longitude_rejected() {
        let text = "[200.0000, 42.8345] and [74.6145, 42.8345]";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.6145);
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let text = "[74.6145, 95.1234]";
        let features = extract_features(text, &SCORES);
        assert!(features.is_empty());
    }

    #[test]
    fn test_labeled_pair_is_mined() {
        let text = "Place it at coordinates: 74.6145, 42.8345 near the park.";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.6145);
    }

    #[test]
    fn test_longitude_latitude_labels_keep_lon_first() {
        let text = "Site 1: longitude: 74.6145, latitude: 42.8345";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.6145);
        assert_eq!(features[0]["geometry"]["coordinates"][1], 42.8345);
    }

    #[test]
    fn test_mined_pair_picks_up_nearby_name_and_reason() {
        let text = "location 4 at [74.6145, 42.8345]. reason: big coverage gap in this district";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["name"], "4");
        assert_eq!(
            features[0]["properties"]["reason"],
            "big coverage gap in this district"
        );
    }

    #[test]
    fn test_mined_pair_defaults_reason() {
        let text = "[74.6145, 42.8345]";
        let features = extract_features(text, &SCORES);
        assert_eq!(features[0]["properties"]["reason"], DEFAULT_REASON);
    }

    #[test]
    fn test_garbage_text_degrades_to_empty() {
        let features = extract_features("I could not produce recommendations, sorry.", &SCORES);
        assert!(features.is_empty());
    }

    #[test]
    fn test_empty_text_degrades_to_empty() {
        assert!(extract_features("", &SCORES).is_empty());
    }

    #[test]
    fn test_broken_fence_falls_back_to_mining() {
        let text = "```json\n{\"type\": \"FeatureCollection\", \"features\": [oops not json\n```\nBut try [74.6145, 42.8345].";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 74.6145);
    }

    #[test]
    fn test_russian_context_does_not_panic() {
        let text = "Рекомендуемая точка 2: координаты: 74.6145, 42.8345 — обоснование: недостаточное покрытие";
        let features = extract_features(text, &SCORES);
        assert_eq!(features.len(), 1);
    }
}
