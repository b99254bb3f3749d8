//! Service status endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;
use crate::routes;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub endpoints: Vec<String>,
    pub scenarios: Vec<&'static str>,
}

/// `GET /`: confirms the server is up and lists its endpoints.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Parley chat server is running".into(),
        status: "active",
        version: parley_core::version(),
        model: state.config.gemini.model.clone(),
        endpoints: vec![
            format!("POST {}", routes::POST_CHAT),
            format!("POST {}", routes::POST_API_CHAT),
            format!("GET {}", routes::GET_SCENARIOS),
            format!("POST {}", routes::POST_WELCOME),
        ],
        scenarios: state.catalog.list().into_keys().collect(),
    })
}
