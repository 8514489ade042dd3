use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::Config;
use crate::db::Database;
use crate::jwt::JwtKeys;
use crate::llm::{lenient, AiGateway};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub ai: AiGateway,
    pub jwt: Arc<JwtKeys>,
    pub config: Arc<Config>,
}

// Domain inputs

/// Profile fields as typed by a user or extracted from screenshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileFields {
    #[validate(length(max = 200))]
    #[serde(deserialize_with = "lenient::option")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub age: Option<u32>,
    #[serde(deserialize_with = "lenient::option")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub occupation: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub education: Option<String>,
    #[validate(length(max = 5000))]
    #[serde(deserialize_with = "lenient::option")]
    pub bio: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub interests: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub prompts: Vec<ProfilePrompt>,
    /// Dating app or social network the profile comes from.
    #[serde(deserialize_with = "lenient::option")]
    pub platform: Option<String>,
}

impl ProfileFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A question/answer prompt shown on many dating profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePrompt {
    #[serde(deserialize_with = "lenient::or_default")]
    pub question: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub answer: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The app user.
    Me,
    /// The person being analyzed or simulated.
    Them,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatTurn {
    #[serde(deserialize_with = "lenient::or_default")]
    pub speaker: Speaker,
    #[serde(deserialize_with = "lenient::or_default")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "lenient::option")]
    pub timestamp: Option<String>,
}

/// Per-request model and language preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Model override; the gateway default is used when absent.
    pub model: Option<String>,
    /// Language for free-text output, as a name ("Spanish") or code ("es").
    pub language: Option<String>,
}

impl AnalysisOptions {
    pub fn language_name(&self) -> String {
        let raw = self
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("en");

        let name = match raw.to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => "English",
            "es" => "Spanish",
            "fr" => "French",
            "de" => "German",
            "it" => "Italian",
            "pt" | "pt-br" => "Portuguese",
            "ja" => "Japanese",
            "ko" => "Korean",
            "zh" | "zh-cn" | "zh-hans" => "Simplified Chinese",
            "zh-tw" | "zh-hant" => "Traditional Chinese",
            "ru" => "Russian",
            _ => raw,
        };
        name.to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct PostInput {
    #[validate(length(max = 10000))]
    pub text: Option<String>,
    #[validate(nested)]
    pub author: Option<ProfileFields>,
    pub posted_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatLogInput {
    #[validate(length(max = 500))]
    pub messages: Vec<ChatTurn>,
    /// Free-form background ("we matched last week", ...).
    #[validate(length(max = 2000))]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalityInput {
    #[validate(nested)]
    pub profile: Option<ProfileFields>,
    #[validate(length(max = 50))]
    pub posts: Vec<String>,
    #[validate(length(max = 500))]
    pub messages: Vec<ChatTurn>,
    /// Earlier overview of the same profile, if one was produced.
    pub overview: Option<ProfileOverview>,
}

/// Who the persona reply should sound like.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonaInput {
    #[validate(nested)]
    pub profile: Option<ProfileFields>,
    pub personality: Option<PersonalityAnalysis>,
}

// Model outputs. Every field may be absent if the model output was unparseable;
// a null or mistyped field only empties itself.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageCategory {
    Profile,
    Post,
    ChatLog,
    Avatar,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileClassification {
    #[serde(deserialize_with = "lenient::option")]
    pub category: Option<ImageCategory>,
    #[serde(deserialize_with = "lenient::option")]
    pub platform: Option<String>,
    /// 0.0 - 1.0
    #[serde(deserialize_with = "lenient::option")]
    pub confidence: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub profile: Option<ProfileFields>,
    #[serde(deserialize_with = "lenient::option")]
    pub post_text: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileOverview {
    #[serde(deserialize_with = "lenient::option")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub first_impression: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub personality_traits: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub interests: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub green_flags: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub red_flags: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub conversation_starters: Vec<String>,
    /// Overall profile quality, 0 - 10.
    #[serde(deserialize_with = "lenient::option")]
    pub profile_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostAnalysis {
    #[serde(deserialize_with = "lenient::option")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub tone: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub themes: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub lifestyle_signals: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub implied_values: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub conversation_hooks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatLogAnalysis {
    #[serde(deserialize_with = "lenient::option")]
    pub summary: Option<String>,
    /// How interested the other person seems, 0 - 10.
    #[serde(deserialize_with = "lenient::option")]
    pub interest_level: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub dynamics: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub green_flags: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub red_flags: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub suggested_replies: Vec<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub next_step: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BigFive {
    #[serde(deserialize_with = "lenient::option")]
    pub openness: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub conscientiousness: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub extraversion: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub agreeableness: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub neuroticism: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalityAnalysis {
    #[serde(deserialize_with = "lenient::option")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub mbti: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub big_five: Option<BigFive>,
    #[serde(deserialize_with = "lenient::option")]
    pub attachment_style: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub love_languages: Vec<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub communication_style: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub growth_areas: Vec<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub compatibility_tips: Vec<String>,
    /// 0.0 - 1.0; low when the evidence was thin.
    #[serde(deserialize_with = "lenient::option")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AvatarAnalysis {
    #[serde(deserialize_with = "lenient::option")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub first_impression: Option<String>,
    #[serde(deserialize_with = "lenient::option")]
    pub vibe: Option<String>,
    /// 0 - 10
    #[serde(deserialize_with = "lenient::option")]
    pub photo_quality: Option<f64>,
    #[serde(deserialize_with = "lenient::option")]
    pub estimated_age_range: Option<String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub suggestions: Vec<String>,
}

/// Result of any structured analysis, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "camelCase")]
pub enum Analysis {
    ProfileClassification(ProfileClassification),
    ProfileOverview(ProfileOverview),
    Post(PostAnalysis),
    ChatLog(ChatLogAnalysis),
    Personality(PersonalityAnalysis),
    Avatar(AvatarAnalysis),
}

// API request/response types

/// An image sent by the client as base64 (a `data:` URL prefix is accepted).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    #[validate(length(min = 1, message = "image data is empty"))]
    pub data: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    #[validate(length(min = 1, max = 10, message = "between 1 and 10 images are required"), nested)]
    pub images: Vec<ImagePayload>,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOverviewRequest {
    #[validate(nested)]
    pub profile: ProfileFields,
    #[serde(default)]
    #[validate(length(max = 10), nested)]
    pub images: Vec<ImagePayload>,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostAnalysisRequest {
    #[validate(nested)]
    pub post: PostInput,
    #[serde(default)]
    #[validate(length(max = 10), nested)]
    pub images: Vec<ImagePayload>,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatLogRequest {
    #[validate(nested)]
    pub chat: ChatLogInput,
    #[serde(default)]
    #[validate(length(max = 10), nested)]
    pub images: Vec<ImagePayload>,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityRequest {
    #[validate(nested)]
    pub input: PersonalityInput,
    #[serde(default)]
    #[validate(length(max = 10), nested)]
    pub images: Vec<ImagePayload>,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvatarRequest {
    #[validate(nested)]
    pub image: ImagePayload,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PersonaReplyRequest {
    #[serde(default)]
    #[validate(nested)]
    pub persona: PersonaInput,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub history: Vec<ChatTurn>,
    #[validate(length(min = 1, max = 4000, message = "message must not be empty"))]
    pub message: String,
    #[serde(flatten)]
    pub options: AnalysisOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaReplyResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompressImageRequest {
    #[validate(nested)]
    pub image: ImagePayload,
    #[validate(range(min = 64, max = 4096))]
    pub max_dimension: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub quality: Option<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressImageResponse {
    pub data: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}
