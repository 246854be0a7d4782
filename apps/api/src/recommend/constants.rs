//! Planning constants: the city boundary, facility-type metadata, and the
//! hard placement rules embedded into every prompt.

/// Official boundary of Bishkek as an ordered `[longitude, latitude]` vertex
/// list, implicitly closed.
pub const CITY_BOUNDARY: &[[f64; 2]] = &[
    [74.4700, 42.8230],
    [74.5050, 42.8030],
    [74.5630, 42.7950],
    [74.6270, 42.7920],
    [74.6900, 42.8010],
    [74.7420, 42.8180],
    [74.7520, 42.8560],
    [74.7280, 42.8900],
    [74.6650, 42.9120],
    [74.5890, 42.9170],
    [74.5200, 42.9020],
    [74.4780, 42.8700],
];

/// Safety margin, in degrees, applied to the strictly-inside-the-boundary
/// rule given to the model.
pub const BOUNDARY_MARGIN_DEG: f64 = 0.001;

/// Minimum spacing between recommended points, in meters.
pub const MIN_SPACING_M: f64 = 500.0;

/// Coverage radius assumed in prompts when a facility record does not carry
/// one, in meters.
pub const DEFAULT_COVERAGE_RADIUS_M: f64 = 500.0;

/// A sub-rectangle of the city that must receive a minimum share of the
/// recommendations.
pub struct PriorityRegion {
    pub name: &'static str,
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

pub const PRIORITY_REGIONS: &[PriorityRegion] = &[PriorityRegion {
    name: "southern residential districts",
    west: 74.5500,
    south: 42.8000,
    east: 74.7000,
    north: 42.8400,
}];

/// Minimum fraction of recommendations that must fall inside the priority
/// regions.
pub const PRIORITY_MIN_FRACTION: f64 = 0.3;

/// Known facility types with display names and nominal coverage radii.
pub struct FacilityTypeInfo {
    pub tag: &'static str,
    pub name: &'static str,
    pub coverage_radius_km: f64,
}

pub const FACILITY_TYPES: &[FacilityTypeInfo] = &[
    FacilityTypeInfo {
        tag: "school",
        name: "School",
        coverage_radius_km: 2.0,
    },
    FacilityTypeInfo {
        tag: "hospital",
        name: "Hospital",
        coverage_radius_km: 3.0,
    },
    FacilityTypeInfo {
        tag: "clinic",
        name: "Clinic",
        coverage_radius_km: 2.0,
    },
    FacilityTypeInfo {
        tag: "kindergarten",
        name: "Kindergarten",
        coverage_radius_km: 1.5,
    },
    FacilityTypeInfo {
        tag: "college",
        name: "College",
        coverage_radius_km: 2.0,
    },
    FacilityTypeInfo {
        tag: "university",
        name: "University",
        coverage_radius_km: 3.0,
    },
    FacilityTypeInfo {
        tag: "fire_station",
        name: "Fire station",
        coverage_radius_km: 3.0,
    },
];

pub fn coverage_radius_km(tag: &str) -> Option<f64> {
    FACILITY_TYPES
        .iter()
        .find(|info| info.tag == tag)
        .map(|info| info.coverage_radius_km)
}
