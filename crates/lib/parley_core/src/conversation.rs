//! Conversation turns, history merging and reply extraction.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chat::ChatError;
use crate::gemini::{GenerateContentResponse, Part};

/// Shown when the upstream API answers without any usable candidate.
pub const NO_CANDIDATES_FALLBACK: &str =
    "Sorry, I could not generate a response. Please try rephrasing your message.";

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Model,
}

/// One message of a conversation.
///
/// Deserializes from either `{role, text}` or the Gemini-native
/// `{role, parts: [{text}]}`; always serializes as `{role, text}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TurnRepr")]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TurnRepr {
    Flat { role: Role, text: String },
    Parts { role: Role, parts: Vec<Part> },
}

impl From<TurnRepr> for Turn {
    fn from(repr: TurnRepr) -> Self {
        match repr {
            TurnRepr::Flat { role, text } => Turn { role, text },
            TurnRepr::Parts { role, parts } => Turn {
                role,
                text: parts.into_iter().filter_map(|p| p.text).collect(),
            },
        }
    }
}

/// Combine caller-supplied history with an optional new user message.
///
/// A blank message counts as absent. Turn order is never changed. Fails with
/// [`ChatError::EmptyInput`] when there is nothing to send.
pub fn merge_history(mut history: Vec<Turn>, message: Option<&str>) -> Result<Vec<Turn>, ChatError> {
    let message = message.filter(|m| !m.trim().is_empty());
    match message {
        Some(text) => {
            history.push(Turn::user(text));
            Ok(history)
        }
        None if history.is_empty() => Err(ChatError::EmptyInput),
        None => Ok(history),
    }
}

/// Why a reply carries placeholder text instead of generated content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The upstream answered successfully but without a usable candidate.
    NoCandidates,
    /// Timeout, non-success status, transport or decode failure.
    Upstream(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoCandidates => f.write_str("no candidates returned"),
            FallbackReason::Upstream(e) => f.write_str(e),
        }
    }
}

/// Text returned to the caller, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Model output.
    Generated(String),
    /// Slash-command confirmation or help.
    Command(String),
    /// Soft failure rendered as placeholder text.
    Fallback(FallbackReason),
}

impl Reply {
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Reply::Generated(text) | Reply::Command(text) => Cow::Borrowed(text),
            Reply::Fallback(FallbackReason::NoCandidates) => Cow::Borrowed(NO_CANDIDATES_FALLBACK),
            Reply::Fallback(FallbackReason::Upstream(e)) => {
                Cow::Owned(format!("Sorry, an error occurred: {e}"))
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Reply::Fallback(_))
    }
}

/// Take the first candidate's text, or fall back when there is none.
pub fn extract_reply(response: GenerateContentResponse) -> Reply {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.text())
        .unwrap_or_default();

    if text.is_empty() {
        Reply::Fallback(FallbackReason::NoCandidates)
    } else {
        Reply::Generated(text)
    }
}
