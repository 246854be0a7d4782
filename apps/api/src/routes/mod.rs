pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::facilities::handlers as facilities;
use crate::recommend::handlers as recommend;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // AI recommendations
        .route("/ai/recommend", post(recommend::handle_recommend))
        // Facility CRUD and filters
        .route(
            "/facilities/",
            post(facilities::handle_create_facility).get(facilities::handle_list_facilities),
        )
        .route(
            "/facilities/type/:facility_type",
            get(facilities::handle_list_facilities_by_type),
        )
        .route("/facilities/:id", get(facilities::handle_get_facility))
        .route("/facility-types", get(facilities::handle_facility_types))
        .with_state(state)
}
