//! Chat request handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use parley_core::chat::{self, ChatInput, ChatOutcome};
use parley_core::conversation::Turn;
use parley_core::scenario::ScenarioKey;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppResult;

/// Body of `POST /chat`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub history: Option<Vec<Turn>>,
    pub scenario: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
}

impl From<ChatRequest> for ChatInput {
    fn from(req: ChatRequest) -> Self {
        ChatInput {
            message: req.message,
            history: req.history.unwrap_or_default(),
            scenario: req.scenario,
            temperature: req.temperature,
            max_output_tokens: req.max_tokens,
        }
    }
}

/// Reply text plus the scenario that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub scenario: ScenarioKey,
}

impl From<ChatOutcome> for ChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        Self {
            response: outcome.reply.text().into_owned(),
            scenario: outcome.scenario,
        }
    }
}

/// `POST /chat`: forward a message (or history) to the model.
///
/// Upstream failures still answer `200` with placeholder text.
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(body) = payload?;
    let outcome = chat::respond(state.generator.as_ref(), &state.catalog, body.into()).await?;
    Ok(Json(outcome.into()))
}
