//! Chat Log Agent
//!
//! Reads a conversation between the user ("me") and a match ("them") and
//! judges how it is going.

use tracing::info;

use crate::agents::prompt;
use crate::llm::{parse_record, AiGateway};
use crate::models::{AnalysisOptions, ChatLogAnalysis, ChatLogInput};
use crate::types::{AiCallOptions, AppError, AppResult, ImageInput};

const SCHEMA: &str = r#"{
  "summary": "what has happened in the conversation so far",
  "interestLevel": 0-10,
  "dynamics": "who drives the conversation, balance, energy",
  "greenFlags": ["positive signal from THEM, with the quote"],
  "redFlags": ["concerning signal from THEM, with the quote"],
  "suggestedReplies": ["message ME could send next"],
  "nextStep": "what ME should do next (keep chatting, suggest a date, ...)"
}"#;

pub struct ChatLogAgent;

impl ChatLogAgent {
    pub async fn analyze_chat_log(
        gateway: &AiGateway,
        chat: &ChatLogInput,
        images: Vec<ImageInput>,
        options: &AnalysisOptions,
    ) -> AppResult<ChatLogAnalysis> {
        if chat.messages.is_empty() && images.is_empty() {
            return Err(AppError::bad_request("Messages or chat screenshots are required"));
        }

        info!(
            messages = chat.messages.len(),
            images = images.len(),
            "Analyzing chat log"
        );

        let prompt = Self::create_prompt(chat, images.len(), options);
        let response = gateway
            .call_ai(
                AiCallOptions::new(prompt)
                    .model(options.model.as_deref())
                    .images(images)
                    .json(),
            )
            .await?;

        let mut analysis: ChatLogAnalysis = parse_record(&response.text);
        if let Some(level) = analysis.interest_level.as_mut() {
            *level = level.clamp(0.0, 10.0);
        }
        Ok(analysis)
    }

    fn create_prompt(chat: &ChatLogInput, image_count: usize, options: &AnalysisOptions) -> String {
        let context = chat
            .context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| format!("Background from ME: {}\n\n", c))
            .unwrap_or_default();

        let transcript = if chat.messages.is_empty() {
            "(transcript only in the attached screenshots; right-side bubbles are ME)\n".to_string()
        } else {
            prompt::render_chat(&chat.messages)
        };

        format!(
            r#"You are a dating coach reviewing a chat between ME (your client) and THEM (a match).

{context}Transcript:
{transcript}{images}
Assess how interested THEM seems, how balanced the conversation is, and what ME
should send next. Suggested replies must sound like ME and fit the conversation.

{instructions}"#,
            context = context,
            transcript = transcript,
            images = prompt::image_note(image_count),
            instructions = prompt::json_instructions(SCHEMA, options)
        )
    }
}
