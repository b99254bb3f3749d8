//! Chat orchestration: scenario resolution, slash commands, history merge and
//! the generation call.
//!
//! Upstream failures never escape as errors. They become
//! [`Reply::Fallback`] so the HTTP layer always answers `200` for valid input.
//! Only empty input and missing configuration surface as [`ChatError`].

use thiserror::Error;
use tracing::{debug, warn};

use crate::conversation::{FallbackReason, Reply, Turn, extract_reply, merge_history};
use crate::gemini::GenerateContentRequest;
use crate::generation::{GenerationError, Generator};
use crate::scenario::{COMMAND_PREFIX, ResolvedScenario, ScenarioCatalog, ScenarioKey};

/// Prompt used for greetings when a scenario has no welcome prompt of its own.
pub const DEFAULT_WELCOME_PROMPT: &str =
    "Greet the user briefly and explain in one sentence how you can help.";

/// Errors that reject a chat request outright.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message and history cannot both be empty")]
    EmptyInput,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// One inbound chat request.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub message: Option<String>,
    pub history: Vec<Turn>,
    pub scenario: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<i64>,
}

/// A reply plus the scenario that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub reply: Reply,
    pub scenario: ScenarioKey,
}

/// Answer a chat request.
pub async fn respond(
    generator: &dyn Generator,
    catalog: &ScenarioCatalog,
    input: ChatInput,
) -> Result<ChatOutcome, ChatError> {
    let resolved = catalog.resolve(
        input.scenario.as_deref().unwrap_or_default(),
        input.temperature,
        input.max_output_tokens,
    );

    if let Some(command) = input
        .message
        .as_deref()
        .and_then(|m| m.trim_start().strip_prefix(COMMAND_PREFIX))
    {
        return run_command(generator, catalog, resolved.key(), &input, command).await;
    }

    let turns = merge_history(input.history, input.message.as_deref())?;
    debug!(scenario = %resolved.key(), turns = turns.len(), "forwarding chat");

    let reply = generate(generator, &resolved, &turns).await?;
    Ok(ChatOutcome {
        reply,
        scenario: resolved.key(),
    })
}

/// Generate a greeting for a scenario without any user message.
pub async fn welcome(
    generator: &dyn Generator,
    catalog: &ScenarioCatalog,
    scenario: Option<&str>,
) -> Result<ChatOutcome, ChatError> {
    let resolved = catalog.resolve(scenario.unwrap_or_default(), None, None);
    let reply = greet(generator, &resolved).await?;
    Ok(ChatOutcome {
        reply,
        scenario: resolved.key(),
    })
}

/// Handle `/<scenario>`: switch scenario and greet, or list the valid commands.
///
/// The greeting for the new scenario keeps the request's sampling overrides.
async fn run_command(
    generator: &dyn Generator,
    catalog: &ScenarioCatalog,
    current: ScenarioKey,
    input: &ChatInput,
    command: &str,
) -> Result<ChatOutcome, ChatError> {
    let Some(key) = ScenarioKey::parse(command.trim()) else {
        debug!(command, "unknown slash command");
        return Ok(ChatOutcome {
            reply: Reply::Command(catalog.command_help()),
            scenario: current,
        });
    };

    let resolved = catalog.resolve(key.as_str(), input.temperature, input.max_output_tokens);
    let mut text = format!("Scenario switched to: {}", resolved.scenario.display_name);
    match greet(generator, &resolved).await? {
        Reply::Generated(greeting) => {
            text.push_str("\n\n");
            text.push_str(&greeting);
        }
        other => debug!(scenario = %key, ?other, "no greeting after scenario switch"),
    }

    Ok(ChatOutcome {
        reply: Reply::Command(text),
        scenario: key,
    })
}

async fn greet(
    generator: &dyn Generator,
    resolved: &ResolvedScenario<'_>,
) -> Result<Reply, ChatError> {
    let prompt = resolved
        .scenario
        .welcome_prompt
        .unwrap_or(DEFAULT_WELCOME_PROMPT);
    generate(generator, resolved, &[Turn::user(prompt)]).await
}

async fn generate(
    generator: &dyn Generator,
    resolved: &ResolvedScenario<'_>,
    turns: &[Turn],
) -> Result<Reply, ChatError> {
    let request = GenerateContentRequest::assemble(resolved, turns);
    match generator.generate(&request).await {
        Ok(response) => {
            let reply = extract_reply(response);
            if reply.is_fallback() {
                warn!(scenario = %resolved.key(), "upstream returned no candidates");
            }
            Ok(reply)
        }
        Err(GenerationError::MissingApiKey) => {
            Err(ChatError::Configuration(GenerationError::MissingApiKey.to_string()))
        }
        Err(e) => {
            warn!(scenario = %resolved.key(), error = %e, "generation failed");
            Ok(Reply::Fallback(FallbackReason::Upstream(e.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::conversation::{NO_CANDIDATES_FALLBACK, Role};
    use crate::gemini::{Candidate, Content, GenerateContentResponse, Part};

    /// Test generator that records requests and replays a canned outcome.
    struct StubGenerator {
        outcome: fn() -> Result<GenerateContentResponse, GenerationError>,
        requests: Mutex<Vec<GenerateContentRequest>>,
    }

    impl StubGenerator {
        fn new(outcome: fn() -> Result<GenerateContentResponse, GenerationError>) -> Self {
            Self {
                outcome,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn replying() -> Self {
            Self::new(|| Ok(text_response("generated")))
        }

        fn requests(&self) -> Vec<GenerateContentRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(
            &self,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            (self.outcome)()
        }
    }

    fn text_response(text: &str) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some(Role::Model),
                    parts: vec![Part::text(text)],
                }),
                finish_reason: None,
            }],
        }
    }

    fn message(text: &str, scenario: Option<&str>) -> ChatInput {
        ChatInput {
            message: Some(text.into()),
            scenario: scenario.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn message_is_forwarded_with_scenario_parameters() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();

        let outcome = respond(&generator, &catalog, message("Hi", Some("creative")))
            .await
            .unwrap();

        assert_eq!(outcome.reply, Reply::Generated("generated".into()));
        assert_eq!(outcome.scenario, ScenarioKey::Creative);

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        let creative = catalog.get(ScenarioKey::Creative);
        assert_eq!(
            requests[0].system_instruction.text(),
            creative.system_instruction
        );
        assert_eq!(requests[0].generation_config.temperature, creative.temperature);
        assert_eq!(requests[0].contents.len(), 1);
        assert_eq!(requests[0].contents[0].text(), "Hi");
    }

    #[tokio::test]
    async fn overrides_reach_the_payload() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();
        let input = ChatInput {
            temperature: Some(0.1),
            max_output_tokens: Some(64),
            ..message("Hi", Some("tech"))
        };

        respond(&generator, &catalog, input).await.unwrap();

        let config = generator.requests()[0].generation_config;
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_output_tokens, 64);
    }

    #[tokio::test]
    async fn unknown_scenario_reports_general() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();

        let outcome = respond(&generator, &catalog, message("Hi", Some("nope")))
            .await
            .unwrap();
        assert_eq!(outcome.scenario, ScenarioKey::General);
    }

    #[tokio::test]
    async fn history_is_sent_in_order() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();
        let input = ChatInput {
            history: vec![Turn::user("Hi"), Turn::model("Hello")],
            ..message("How are you?", None)
        };

        respond(&generator, &catalog, input).await.unwrap();

        let contents = &generator.requests()[0].contents;
        let texts: Vec<String> = contents.iter().map(Content::text).collect();
        assert_eq!(texts, ["Hi", "Hello", "How are you?"]);
        assert_eq!(contents[2].role, Some(Role::User));
    }

    #[tokio::test]
    async fn empty_input_never_reaches_upstream() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();

        let err = respond(&generator, &catalog, ChatInput::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::EmptyInput));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_candidates_become_fallback_text() {
        let generator = StubGenerator::new(|| Ok(GenerateContentResponse::default()));
        let catalog = ScenarioCatalog::builtin();

        let outcome = respond(&generator, &catalog, message("Hi", None))
            .await
            .unwrap();

        assert_eq!(outcome.reply.text(), NO_CANDIDATES_FALLBACK);
    }

    #[tokio::test]
    async fn upstream_failure_is_soft() {
        let generator = StubGenerator::new(|| {
            Err(GenerationError::Status {
                status: 503,
                body: "unavailable".into(),
            })
        });
        let catalog = ScenarioCatalog::builtin();

        let outcome = respond(&generator, &catalog, message("Hi", Some("ideas")))
            .await
            .unwrap();

        assert!(outcome.reply.is_fallback());
        assert!(outcome.reply.text().starts_with("Sorry, an error occurred:"));
        assert!(outcome.reply.text().contains("503"));
        assert_eq!(outcome.scenario, ScenarioKey::Ideas);
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let generator = StubGenerator::new(|| Err(GenerationError::MissingApiKey));
        let catalog = ScenarioCatalog::builtin();

        let err = respond(&generator, &catalog, message("Hi", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
    }

    #[tokio::test]
    async fn slash_command_switches_scenario_and_greets() {
        let generator = StubGenerator::new(|| Ok(text_response("Welcome, engineer!")));
        let catalog = ScenarioCatalog::builtin();

        let outcome = respond(&generator, &catalog, message("/tech", Some("general")))
            .await
            .unwrap();

        assert_eq!(outcome.scenario, ScenarioKey::Tech);
        let text = outcome.reply.text();
        assert!(text.contains("Technical expert"), "{text}");
        assert!(text.ends_with("Welcome, engineer!"), "{text}");

        // The greeting uses the new scenario's own welcome prompt and instruction.
        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        let tech = catalog.get(ScenarioKey::Tech);
        assert_eq!(requests[0].system_instruction.text(), tech.system_instruction);
        assert_eq!(
            requests[0].contents[0].text(),
            tech.welcome_prompt.unwrap()
        );
    }

    #[tokio::test]
    async fn slash_command_greeting_keeps_request_overrides() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();
        let input = ChatInput {
            temperature: Some(0.0),
            max_output_tokens: Some(10),
            ..message("/tech", Some("creative"))
        };

        let outcome = respond(&generator, &catalog, input).await.unwrap();

        assert_eq!(outcome.scenario, ScenarioKey::Tech);
        let request = &generator.requests()[0];
        assert_eq!(
            request.system_instruction.text(),
            catalog.get(ScenarioKey::Tech).system_instruction
        );
        assert_eq!(request.generation_config.temperature, 0.0);
        assert_eq!(request.generation_config.max_output_tokens, 10);
    }

    #[tokio::test]
    async fn slash_command_greeting_uses_new_scenario_defaults() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();

        respond(&generator, &catalog, message("/tech", Some("creative")))
            .await
            .unwrap();

        let tech = catalog.get(ScenarioKey::Tech);
        let config = generator.requests()[0].generation_config;
        assert_eq!(config.temperature, tech.temperature);
        assert_eq!(config.max_output_tokens, tech.max_output_tokens);
    }

    #[tokio::test]
    async fn out_of_range_overrides_are_passed_through() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();
        let input = ChatInput {
            temperature: Some(-3.5),
            max_output_tokens: Some(-5),
            ..message("Hi", None)
        };

        respond(&generator, &catalog, input).await.unwrap();

        let config = generator.requests()[0].generation_config;
        assert_eq!(config.temperature, -3.5);
        assert_eq!(config.max_output_tokens, -5);
    }

    #[tokio::test]
    async fn slash_command_without_welcome_prompt_uses_default() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();

        respond(&generator, &catalog, message("/ideas", None))
            .await
            .unwrap();

        assert_eq!(
            generator.requests()[0].contents[0].text(),
            DEFAULT_WELCOME_PROMPT
        );
    }

    #[tokio::test]
    async fn slash_command_keeps_confirmation_when_greeting_fails() {
        let generator = StubGenerator::new(|| Err(GenerationError::Transport("reset".into())));
        let catalog = ScenarioCatalog::builtin();

        let outcome = respond(&generator, &catalog, message("/creative", None))
            .await
            .unwrap();

        assert_eq!(
            outcome.reply,
            Reply::Command("Scenario switched to: Creative writer".into())
        );
        assert_eq!(outcome.scenario, ScenarioKey::Creative);
    }

    #[tokio::test]
    async fn unknown_command_lists_valid_commands() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();

        for cmd in ["/help", "/Tech", "/"] {
            let outcome = respond(&generator, &catalog, message(cmd, Some("ideas")))
                .await
                .unwrap();

            let text = outcome.reply.text();
            for name in ["/general", "/tech", "/creative", "/ideas"] {
                assert!(text.contains(name), "{cmd}: missing {name} in {text}");
            }
            assert_eq!(outcome.scenario, ScenarioKey::Ideas);
        }
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn welcome_uses_scenario_prompt() {
        let generator = StubGenerator::new(|| Ok(text_response("Hello there")));
        let catalog = ScenarioCatalog::builtin();

        let outcome = welcome(&generator, &catalog, Some("creative")).await.unwrap();

        assert_eq!(outcome.reply, Reply::Generated("Hello there".into()));
        assert_eq!(outcome.scenario, ScenarioKey::Creative);
        assert_eq!(
            generator.requests()[0].contents[0].text(),
            catalog.welcome_prompt(ScenarioKey::Creative).unwrap()
        );
    }

    #[tokio::test]
    async fn welcome_defaults_to_general() {
        let generator = StubGenerator::replying();
        let catalog = ScenarioCatalog::builtin();

        let outcome = welcome(&generator, &catalog, None).await.unwrap();
        assert_eq!(outcome.scenario, ScenarioKey::General);
    }
}
