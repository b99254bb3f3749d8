//! Welcome message handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use parley_core::chat;
use serde::Deserialize;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::handlers::chat::ChatResponse;

#[derive(Debug, Default, Deserialize)]
pub struct WelcomeRequest {
    pub scenario: Option<String>,
}

impl WelcomeRequest {
    /// Parse an optional JSON body; an empty body means "no preference".
    fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.trim_ascii().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Failed to parse the request body as JSON: {e}")))
    }
}

/// `POST /welcome`: generate a greeting for a scenario.
///
/// A request without a body greets with the default scenario.
pub async fn welcome_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<ChatResponse>> {
    let request = WelcomeRequest::from_body(&body)?;
    let outcome = chat::welcome(
        state.generator.as_ref(),
        &state.catalog,
        request.scenario.as_deref(),
    )
    .await?;
    Ok(Json(outcome.into()))
}
