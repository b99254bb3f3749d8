//! Scenario listing.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;

use crate::AppState;

/// `GET /scenarios`: key → display name for every scenario.
pub async fn list_scenarios_handler(
    State(state): State<AppState>,
) -> Json<BTreeMap<&'static str, &'static str>> {
    Json(state.catalog.list())
}
