//! Classification Agent
//!
//! Looks at uploaded screenshots, decides what they show (a dating profile, a
//! social post, a chat log, a single photo) and pulls out the text so later
//! analyses can work from structured fields.

use tracing::info;

use crate::agents::prompt;
use crate::llm::{parse_record, AiGateway};
use crate::models::{AnalysisOptions, ProfileClassification};
use crate::types::{AiCallOptions, AppError, AppResult, ImageInput};

const SCHEMA: &str = r#"{
  "category": "profile" | "post" | "chatLog" | "avatar" | "other",
  "platform": "app or network name, or null",
  "confidence": 0.0-1.0,
  "profile": {
    "name": null, "age": null, "gender": null, "location": null,
    "occupation": null, "education": null, "bio": null,
    "interests": [], "prompts": [{"question": "", "answer": ""}], "platform": null
  },
  "postText": "caption and visible text of a post, or null",
  "messages": [{"speaker": "me" | "them", "text": "", "timestamp": null}]
}"#;

pub struct ClassificationAgent;

impl ClassificationAgent {
    pub async fn classify_and_extract(
        gateway: &AiGateway,
        images: Vec<ImageInput>,
        options: &AnalysisOptions,
    ) -> AppResult<ProfileClassification> {
        if images.is_empty() {
            return Err(AppError::bad_request("At least one image is required"));
        }

        info!(images = images.len(), "Classifying screenshots");

        let prompt = Self::create_prompt(images.len(), options);
        let response = gateway
            .call_ai(
                AiCallOptions::new(prompt)
                    .model(options.model.as_deref())
                    .images(images)
                    .json()
                    .thinking_budget(0),
            )
            .await?;

        let mut classification: ProfileClassification = parse_record(&response.text);
        if let Some(confidence) = classification.confidence.as_mut() {
            *confidence = confidence.clamp(0.0, 1.0);
        }

        info!(category = ?classification.category, "Classification complete");
        Ok(classification)
    }

    fn create_prompt(image_count: usize, options: &AnalysisOptions) -> String {
        format!(
            r#"You are helping someone understand screenshots from dating apps and social networks.

{images}
Tasks:
1. Decide which single category best describes the screenshots:
   - "profile": a dating or social profile page
   - "post": a social media post, story or caption
   - "chatLog": a messaging conversation
   - "avatar": a single portrait photo with no surrounding UI
   - "other": anything else
2. Identify the platform if its UI is recognisable.
3. Extract the visible text into the matching fields. For chat logs, messages on
   the right side of the screen are "me" and messages on the left are "them".
   Keep the original wording of extracted text.

{instructions}"#,
            images = prompt::image_note(image_count),
            instructions = prompt::json_instructions(SCHEMA, options)
        )
    }
}
