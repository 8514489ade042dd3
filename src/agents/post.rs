//! Post Agent
//!
//! Reads a single social post (caption, optional author details, screenshots)
//! for what it reveals about the poster.

use tracing::info;

use crate::agents::prompt;
use crate::llm::{parse_record, AiGateway};
use crate::models::{AnalysisOptions, PostAnalysis, PostInput};
use crate::types::{AiCallOptions, AppError, AppResult, ImageInput};

const SCHEMA: &str = r#"{
  "summary": "what the post is about, one or two sentences",
  "tone": "overall tone in a few words",
  "themes": ["theme"],
  "lifestyleSignals": ["what the post suggests about daily life"],
  "impliedValues": ["value the poster seems to hold"],
  "conversationHooks": ["natural way to reply to or bring up the post"]
}"#;

pub struct PostAgent;

impl PostAgent {
    pub async fn analyze_post(
        gateway: &AiGateway,
        post: &PostInput,
        images: Vec<ImageInput>,
        options: &AnalysisOptions,
    ) -> AppResult<PostAnalysis> {
        let has_text = post.text.as_deref().is_some_and(|t| !t.trim().is_empty());
        if !has_text && images.is_empty() {
            return Err(AppError::bad_request("Post text or images are required"));
        }

        info!(images = images.len(), has_text, "Analyzing post");

        let prompt = Self::create_prompt(post, images.len(), options);
        let response = gateway
            .call_ai(
                AiCallOptions::new(prompt)
                    .model(options.model.as_deref())
                    .images(images)
                    .json(),
            )
            .await?;

        Ok(parse_record(&response.text))
    }

    fn create_prompt(post: &PostInput, image_count: usize, options: &AnalysisOptions) -> String {
        let mut material = String::new();
        if let Some(text) = post.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            material.push_str(&format!("Post text:\n\"\"\"\n{}\n\"\"\"\n", text));
        }
        if let Some(posted_at) = &post.posted_at {
            material.push_str(&format!("Posted: {}\n", posted_at));
        }
        if let Some(author) = post.author.as_ref().filter(|a| !a.is_empty()) {
            material.push_str("\nAbout the author:\n");
            material.push_str(&prompt::render_profile(author));
        }

        format!(
            r#"You are reading a social media post from someone the user is interested in.

{material}{images}
Explain what the post says about the person who wrote it and how the user could
bring it up in conversation without sounding like they studied it.

{instructions}"#,
            material = material,
            images = prompt::image_note(image_count),
            instructions = prompt::json_instructions(SCHEMA, options)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::testing::{gateway, ScriptedProvider};
    use crate::models::ProfileFields;

    #[tokio::test]
    async fn test_analyze_text_post() {
        let provider = ScriptedProvider::replying(
            r#"{"tone": "proud", "themes": ["running", "discipline"], "conversationHooks": ["Ask about the next race"]}"#,
        );
        let gateway = gateway(provider.clone());
        let post = PostInput {
            text: Some("First half marathon done! 1:52 🏃".to_string()),
            author: Some(ProfileFields {
                name: Some("Sam".to_string()),
                ..Default::default()
            }),
            posted_at: Some("2024-05-12".to_string()),
        };

        let analysis = PostAgent::analyze_post(&gateway, &post, vec![], &AnalysisOptions::default())
            .await
            .unwrap();

        assert_eq!(analysis.tone.as_deref(), Some("proud"));
        assert_eq!(analysis.themes.len(), 2);
        assert!(analysis.summary.is_none());

        let call = provider.last_call();
        assert!(call.prompt.contains("First half marathon done!"));
        assert!(call.prompt.contains("Posted: 2024-05-12"));
        assert!(call.prompt.contains("- Name: Sam"));
        assert!(call.images.is_empty());
    }

    #[tokio::test]
    async fn test_image_only_post_is_accepted() {
        let provider = ScriptedProvider::replying("{}");
        let gateway = gateway(provider.clone());

        PostAgent::analyze_post(
            &gateway,
            &PostInput::default(),
            vec![ImageInput::jpeg(vec![9])],
            &AnalysisOptions::default(),
        )
        .await
        .unwrap();

        assert!(!provider.last_call().prompt.contains("Post text"));
    }

    #[tokio::test]
    async fn test_blank_post_is_rejected() {
        let gateway = gateway(ScriptedProvider::replying("{}"));
        let post = PostInput {
            text: Some("   ".to_string()),
            ..Default::default()
        };
        let err = PostAgent::analyze_post(&gateway, &post, vec![], &AnalysisOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_operational());
    }
}
