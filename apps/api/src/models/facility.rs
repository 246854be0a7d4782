use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted infrastructure facility. Immutable after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FacilityRecord {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub facility_type: String,
    pub city: String,
    pub country: String,
}

/// Payload for creating a new facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityCreate {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub facility_type: String,
    pub city: String,
    pub country: String,
}

/// Query-string filter over facilities. All supplied filters combine
/// conjunctively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacilityFilter {
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lon: Option<f64>,
    pub max_lon: Option<f64>,
    pub facility_type: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_deserializes_from_query_string() {
        let filter: FacilityFilter =
            serde_urlencoded::from_str("min_lat=42.8&max_lat=42.9&facility_type=hospital")
                .unwrap();
        assert_eq!(filter.min_lat, Some(42.8));
        assert_eq!(filter.max_lat, Some(42.9));
        assert_eq!(filter.facility_type.as_deref(), Some("hospital"));
        assert!(filter.city.is_none());
    }

    #[test]
    fn test_filter_defaults_to_no_constraints() {
        let filter = FacilityFilter::default();
        assert!(filter.min_lat.is_none());
        assert!(filter.facility_type.is_none());
    }

    #[test]
    fn test_facility_create_round_trips_through_json() {
        let create = FacilityCreate {
            name: "School #24".to_string(),
            address: "12 Chuy Ave".to_string(),
            latitude: 42.8746,
            longitude: 74.5698,
            facility_type: "school".to_string(),
            city: "Bishkek".to_string(),
            country: "Kyrgyzstan".to_string(),
        };
        let json = serde_json::to_string(&create).unwrap();
        let back: FacilityCreate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, create.name);
        assert_eq!(back.latitude, create.latitude);
        assert_eq!(back.facility_type, create.facility_type);
    }
}
