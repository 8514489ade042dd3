//! Profile Agent
//!
//! Produces a first-read overview of a dating profile and critiques single
//! profile photos.

use tracing::info;

use crate::agents::prompt;
use crate::llm::{parse_record, AiGateway};
use crate::models::{AnalysisOptions, AvatarAnalysis, ProfileFields, ProfileOverview};
use crate::types::{AiCallOptions, AppError, AppResult, ImageInput};

const OVERVIEW_SCHEMA: &str = r#"{
  "summary": "2-3 sentence overview of who this person seems to be",
  "firstImpression": "the gut reaction a typical match would have",
  "personalityTraits": ["trait"],
  "interests": ["interest"],
  "greenFlags": ["positive signal, with the evidence"],
  "redFlags": ["concerning signal, with the evidence"],
  "conversationStarters": ["specific opener referencing the profile"],
  "profileScore": 0-10
}"#;

const AVATAR_SCHEMA: &str = r#"{
  "description": "what the photo shows",
  "firstImpression": "how the person comes across",
  "vibe": "two or three words",
  "photoQuality": 0-10,
  "estimatedAgeRange": "e.g. 25-30, or null",
  "suggestions": ["concrete improvement"]
}"#;

pub struct ProfileAgent;

impl ProfileAgent {
    pub async fn analyze_profile_overview(
        gateway: &AiGateway,
        profile: &ProfileFields,
        images: Vec<ImageInput>,
        options: &AnalysisOptions,
    ) -> AppResult<ProfileOverview> {
        if profile.is_empty() && images.is_empty() {
            return Err(AppError::bad_request("Profile fields or photos are required"));
        }

        info!(images = images.len(), "Analyzing profile overview");

        let prompt = Self::create_overview_prompt(profile, images.len(), options);
        let response = gateway
            .call_ai(
                AiCallOptions::new(prompt)
                    .model(options.model.as_deref())
                    .images(images)
                    .json(),
            )
            .await?;

        let mut overview: ProfileOverview = parse_record(&response.text);
        if let Some(score) = overview.profile_score.as_mut() {
            *score = score.clamp(0.0, 10.0);
        }
        Ok(overview)
    }

    pub async fn analyze_avatar(
        gateway: &AiGateway,
        image: ImageInput,
        options: &AnalysisOptions,
    ) -> AppResult<AvatarAnalysis> {
        info!(bytes = image.data.len(), "Analyzing avatar");

        let prompt = format!(
            r#"You are a friendly but candid dating-profile photographer.
Review the attached profile photo as a potential match would see it.

{}"#,
            prompt::json_instructions(AVATAR_SCHEMA, options)
        );

        let response = gateway
            .call_ai(
                AiCallOptions::new(prompt)
                    .model(options.model.as_deref())
                    .images(vec![image])
                    .json()
                    .thinking_budget(0),
            )
            .await?;

        let mut avatar: AvatarAnalysis = parse_record(&response.text);
        if let Some(quality) = avatar.photo_quality.as_mut() {
            *quality = quality.clamp(0.0, 10.0);
        }
        Ok(avatar)
    }

    fn create_overview_prompt(
        profile: &ProfileFields,
        image_count: usize,
        options: &AnalysisOptions,
    ) -> String {
        format!(
            r#"You are an experienced dating coach reading someone's profile for the first time.

Profile:
{profile}
{images}
Give an overview of the person behind the profile: what they signal, what they
seem to be looking for, and how someone could start a good conversation with them.
Base every claim on the profile text or photos.

{instructions}"#,
            profile = prompt::render_profile(profile),
            images = prompt::image_note(image_count),
            instructions = prompt::json_instructions(OVERVIEW_SCHEMA, options)
        )
    }
}
