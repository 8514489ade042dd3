//! Personality Agent
//!
//! Builds a personality report from everything known about a person: profile
//! fields, posts, chat messages, an earlier overview and screenshots. Scores
//! are clamped to their ranges and confidence drops when evidence is thin.

use tracing::info;

use crate::agents::prompt;
use crate::llm::{parse_record, AiGateway};
use crate::models::{AnalysisOptions, PersonalityAnalysis, PersonalityInput};
use crate::types::{AiCallOptions, AppError, AppResult, ImageInput};

const SCHEMA: &str = r#"{
  "summary": "short portrait of the person",
  "mbti": "four-letter type or null",
  "bigFive": {
    "openness": 0-100, "conscientiousness": 0-100, "extraversion": 0-100,
    "agreeableness": 0-100, "neuroticism": 0-100
  },
  "attachmentStyle": "secure | anxious | avoidant | fearful-avoidant | null",
  "loveLanguages": ["language"],
  "communicationStyle": "how they write and respond",
  "strengths": ["strength"],
  "growthAreas": ["area"],
  "compatibilityTips": ["practical tip for someone dating them"],
  "confidence": 0.0-1.0
}"#;

/// Below this many pieces of evidence the report is capped at low confidence.
const THIN_EVIDENCE: usize = 3;
const THIN_EVIDENCE_CONFIDENCE: f64 = 0.4;

pub struct PersonalityAgent;

impl PersonalityAgent {
    pub async fn analyze_personality(
        gateway: &AiGateway,
        input: &PersonalityInput,
        images: Vec<ImageInput>,
        options: &AnalysisOptions,
    ) -> AppResult<PersonalityAnalysis> {
        let evidence = Self::evidence_count(input) + images.len();
        if evidence == 0 {
            return Err(AppError::bad_request(
                "A profile, posts, messages or images are required",
            ));
        }

        info!(evidence, images = images.len(), "Analyzing personality");

        let prompt = Self::create_prompt(input, images.len(), options);
        let response = gateway
            .call_ai(
                AiCallOptions::new(prompt)
                    .model(options.model.as_deref())
                    .images(images)
                    .json(),
            )
            .await?;

        let mut analysis: PersonalityAnalysis = parse_record(&response.text);
        Self::normalize(&mut analysis, evidence);
        Ok(analysis)
    }

    fn evidence_count(input: &PersonalityInput) -> usize {
        let profile = input.profile.as_ref().is_some_and(|p| !p.is_empty()) as usize;
        let overview = input.overview.is_some() as usize;
        let posts = input.posts.iter().filter(|p| !p.trim().is_empty()).count();
        let messages = input
            .messages
            .iter()
            .filter(|m| !m.text.trim().is_empty())
            .count();
        profile + overview + posts + messages
    }

    fn normalize(analysis: &mut PersonalityAnalysis, evidence: usize) {
        if let Some(big_five) = analysis.big_five.as_mut() {
            for score in [
                &mut big_five.openness,
                &mut big_five.conscientiousness,
                &mut big_five.extraversion,
                &mut big_five.agreeableness,
                &mut big_five.neuroticism,
            ] {
                if let Some(value) = score.as_mut() {
                    *value = value.clamp(0.0, 100.0);
                }
            }
        }

        if let Some(mbti) = analysis.mbti.as_mut() {
            *mbti = mbti.trim().to_uppercase();
        }

        if let Some(confidence) = analysis.confidence.as_mut() {
            *confidence = confidence.clamp(0.0, 1.0);
            if evidence < THIN_EVIDENCE {
                *confidence = confidence.min(THIN_EVIDENCE_CONFIDENCE);
            }
        }
    }

    fn create_prompt(input: &PersonalityInput, image_count: usize, options: &AnalysisOptions) -> String {
        let mut material = String::new();

        if let Some(profile) = input.profile.as_ref().filter(|p| !p.is_empty()) {
            material.push_str("Profile:\n");
            material.push_str(&prompt::render_profile(profile));
            material.push('\n');
        }

        if let Some(overview) = &input.overview {
            if let Ok(json) = serde_json::to_string(overview) {
                material.push_str(&format!("Earlier profile overview (JSON):\n{}\n\n", json));
            }
        }

        let posts: Vec<&str> = input
            .posts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if !posts.is_empty() {
            material.push_str("Posts:\n");
            for (i, post) in posts.iter().enumerate() {
                material.push_str(&format!("{}. {}\n", i + 1, post));
            }
            material.push('\n');
        }

        if !input.messages.is_empty() {
            material.push_str("Messages (THEM is the person being analyzed):\n");
            material.push_str(&prompt::render_chat(&input.messages));
            material.push('\n');
        }

        format!(
            r#"You are a psychologist writing a careful, non-clinical personality read of someone
from their online presence.

{material}{images}
Use only the evidence above. Score the Big Five from 0 to 100. When evidence for a
field is missing, use null rather than guessing, and lower "confidence" when the
material is thin.

{instructions}"#,
            material = material,
            images = prompt::image_note(image_count),
            instructions = prompt::json_instructions(SCHEMA, options)
        )
    }
}
