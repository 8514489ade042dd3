//! Persona Agent
//!
//! Role-plays the analyzed person so the user can rehearse a conversation.
//! Returns plain text, one chat message long.

use tracing::info;

use crate::agents::prompt;
use crate::llm::AiGateway;
use crate::models::{AnalysisOptions, ChatTurn, PersonaInput};
use crate::types::{AiCallOptions, AppError, AppResult};

/// Only the tail of a long history is sent to the model.
const MAX_HISTORY_TURNS: usize = 30;

pub struct PersonaAgent;

impl PersonaAgent {
    pub async fn generate_persona_reply(
        gateway: &AiGateway,
        persona: &PersonaInput,
        history: &[ChatTurn],
        message: &str,
        options: &AnalysisOptions,
    ) -> AppResult<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::bad_request("Message is required"));
        }

        info!(history = history.len(), "Generating persona reply");

        let prompt = Self::create_prompt(persona, history, message, options);
        let response = gateway
            .call_ai(
                AiCallOptions::new(prompt)
                    .model(options.model.as_deref())
                    .thinking_budget(0),
            )
            .await?;

        let reply = Self::clean_reply(&response.text);
        if reply.is_empty() {
            return Err(AppError::AiApi("Persona reply was empty".to_string()));
        }
        Ok(reply)
    }

    /// Strip the wrapping quotes and speaker labels models like to add.
    fn clean_reply(text: &str) -> String {
        let mut reply = text.trim();
        for label in ["THEM:", "Them:", "them:"] {
            if let Some(rest) = reply.strip_prefix(label) {
                reply = rest.trim_start();
            }
        }
        reply
            .trim_matches(|c| c == '"' || c == '“' || c == '”')
            .trim()
            .to_string()
    }

    fn create_prompt(
        persona: &PersonaInput,
        history: &[ChatTurn],
        message: &str,
        options: &AnalysisOptions,
    ) -> String {
        let mut character = String::new();
        if let Some(profile) = &persona.profile {
            character.push_str(&prompt::render_profile(profile));
        }
        if let Some(personality) = &persona.personality {
            if let Some(summary) = &personality.summary {
                character.push_str(&format!("- Personality: {}\n", summary));
            }
            if let Some(style) = &personality.communication_style {
                character.push_str(&format!("- Texting style: {}\n", style));
            }
            if let Some(mbti) = &personality.mbti {
                character.push_str(&format!("- MBTI: {}\n", mbti));
            }
        }
        if character.is_empty() {
            character.push_str("(little is known; be a friendly, slightly reserved match)\n");
        }

        let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
        let transcript = if history.is_empty() {
            String::new()
        } else {
            format!("Conversation so far:\n{}\n", prompt::render_chat(&history[start..]))
        };

        format!(
            r#"You are THEM, a person on a dating app, chatting with ME.
Stay fully in character. Never mention being an AI or a simulation.

Who you are:
{character}
{transcript}ME just wrote: {message}

Reply as THEM with a single chat message in {language}, matching the length and tone
of your earlier messages. Output only the message text, without quotes or labels."#,
            character = character,
            transcript = transcript,
            message = message,
            language = options.language_name()
        )
    }
}
