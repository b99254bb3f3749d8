//! Scenario catalog and resolution.
//!
//! A scenario bundles a system instruction with default sampling parameters
//! for one conversational mode. The catalog is built once at startup and never
//! mutated; the active scenario is always chosen per request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Nucleus-sampling probability mass, shared by every scenario.
pub const TOP_P: f64 = 0.95;

/// Top-k sampling cutoff, shared by every scenario.
pub const TOP_K: u32 = 40;

/// Prefix that marks a chat message as a slash command.
pub const COMMAND_PREFIX: char = '/';

/// Stable identifier of a catalog entry.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScenarioKey {
    #[default]
    General,
    Tech,
    Creative,
    Ideas,
}

impl ScenarioKey {
    /// Case-sensitive lookup; `None` for anything outside the catalog.
    pub fn parse(key: &str) -> Option<Self> {
        key.parse().ok()
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One preset of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub key: ScenarioKey,
    pub display_name: &'static str,
    pub temperature: f64,
    pub max_output_tokens: i64,
    pub system_instruction: &'static str,
    /// Prompt sent in place of a user message to synthesize a greeting.
    pub welcome_prompt: Option<&'static str>,
}

/// Sampling parameters sent with a generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    /// Signed so out-of-range overrides still reach the upstream API.
    pub max_output_tokens: i64,
}

/// A scenario with per-request overrides applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedScenario<'a> {
    pub scenario: &'a Scenario,
    pub params: GenerationParams,
}

impl ResolvedScenario<'_> {
    pub fn key(&self) -> ScenarioKey {
        self.scenario.key
    }
}

/// Immutable mapping from [`ScenarioKey`] to [`Scenario`].
///
/// Storage is indexed by the key's discriminant, so every lookup is O(1) and
/// total.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: [Scenario; 4],
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScenarioCatalog {
    /// The presets shipped with the service.
    pub fn builtin() -> Self {
        Self {
            scenarios: [
                preset(ScenarioKey::General),
                preset(ScenarioKey::Tech),
                preset(ScenarioKey::Creative),
                preset(ScenarioKey::Ideas),
            ],
        }
    }

    pub fn get(&self, key: ScenarioKey) -> &Scenario {
        &self.scenarios[key.index()]
    }

    /// Resolve a requested key and optional overrides.
    ///
    /// Unknown keys fall back to [`ScenarioKey::General`]. Overrides are taken
    /// verbatim; range checks are left to the upstream API.
    pub fn resolve(
        &self,
        key: &str,
        temperature: Option<f64>,
        max_output_tokens: Option<i64>,
    ) -> ResolvedScenario<'_> {
        let scenario = self.get(ScenarioKey::parse(key).unwrap_or_default());
        ResolvedScenario {
            scenario,
            params: GenerationParams {
                temperature: temperature.unwrap_or(scenario.temperature),
                max_output_tokens: max_output_tokens.unwrap_or(scenario.max_output_tokens),
            },
        }
    }

    /// Key → display name for every entry.
    pub fn list(&self) -> BTreeMap<&'static str, &'static str> {
        self.scenarios
            .iter()
            .map(|s| (s.key.as_str(), s.display_name))
            .collect()
    }

    pub fn welcome_prompt(&self, key: ScenarioKey) -> Option<&'static str> {
        self.get(key).welcome_prompt
    }

    /// Help text for the slash-command shortcut.
    pub fn command_help(&self) -> String {
        let commands: Vec<String> = ScenarioKey::iter()
            .map(|key| format!("{COMMAND_PREFIX}{key} ({})", self.get(key).display_name))
            .collect();
        format!("Available commands: {}", commands.join(", "))
    }
}

fn preset(key: ScenarioKey) -> Scenario {
    match key {
        ScenarioKey::General => Scenario {
            key,
            display_name: "General assistant",
            temperature: 0.7,
            max_output_tokens: 1024,
            system_instruction: "You are a friendly, knowledgeable assistant. \
                Answer clearly and concisely, and ask a clarifying question when \
                the request is ambiguous.",
            welcome_prompt: Some(
                "Greet the user in one or two sentences and offer help with any question.",
            ),
        },
        ScenarioKey::Tech => Scenario {
            key,
            display_name: "Technical expert",
            temperature: 0.3,
            max_output_tokens: 2048,
            system_instruction: "You are an experienced software engineer. \
                Give precise, technically correct answers, include short code \
                examples when they help, and state assumptions explicitly.",
            welcome_prompt: Some(
                "Introduce yourself as a technical expert in one or two sentences \
                 and ask what the user is working on.",
            ),
        },
        ScenarioKey::Creative => Scenario {
            key,
            display_name: "Creative writer",
            temperature: 0.9,
            max_output_tokens: 2048,
            system_instruction: "You are an imaginative writer. Use vivid \
                language, play with form and style, and adapt your tone to the \
                user's request.",
            welcome_prompt: Some(
                "Greet the user with a short, playful line and invite them to \
                 start a story, poem or any creative piece together.",
            ),
        },
        ScenarioKey::Ideas => Scenario {
            key,
            display_name: "Idea generator",
            temperature: 0.8,
            max_output_tokens: 1536,
            system_instruction: "You are a brainstorming partner. Offer several \
                distinct, concrete ideas as a short list, then suggest which one \
                to explore first and why.",
            welcome_prompt: None,
        },
    }
}
