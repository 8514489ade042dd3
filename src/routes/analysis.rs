//! AI analysis endpoints
//!
//! Every handler decodes and shrinks uploaded images, hands the material to
//! the matching agent and wraps the result in an [`Analysis`] envelope.

use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::agents::{
    ChatLogAgent, ClassificationAgent, PersonaAgent, PersonalityAgent, PostAgent, ProfileAgent,
};
use crate::middleware::AuthenticatedUser;
use crate::models::{
    Analysis, AppState, AvatarRequest, ChatLogRequest, ClassifyRequest, PersonaReplyRequest,
    PersonaReplyResponse, PersonalityRequest, PostAnalysisRequest, ProfileOverviewRequest,
};
use crate::routes::extract::ValidatedJson;
use crate::types::AppResult;
use crate::utils::image::{prepare_image, prepare_images};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai/classify", post(classify))
        .route("/api/ai/profile-overview", post(profile_overview))
        .route("/api/ai/post", post(post_analysis))
        .route("/api/ai/chat-log", post(chat_log))
        .route("/api/ai/personality", post(personality))
        .route("/api/ai/avatar", post(avatar))
        .route("/api/ai/persona-reply", post(persona_reply))
        .with_state(state)
}

async fn classify(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ClassifyRequest>,
) -> AppResult<Json<Analysis>> {
    info!(user_id = %user.user_id, images = request.images.len(), "Classify request");

    let images = prepare_images(&request.images).await?;
    let result = ClassificationAgent::classify_and_extract(&state.ai, images, &request.options).await?;
    Ok(Json(Analysis::ProfileClassification(result)))
}

async fn profile_overview(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ProfileOverviewRequest>,
) -> AppResult<Json<Analysis>> {
    info!(user_id = %user.user_id, "Profile overview request");

    let images = prepare_images(&request.images).await?;
    let result =
        ProfileAgent::analyze_profile_overview(&state.ai, &request.profile, images, &request.options)
            .await?;
    Ok(Json(Analysis::ProfileOverview(result)))
}

async fn post_analysis(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<PostAnalysisRequest>,
) -> AppResult<Json<Analysis>> {
    info!(user_id = %user.user_id, "Post analysis request");

    let images = prepare_images(&request.images).await?;
    let result = PostAgent::analyze_post(&state.ai, &request.post, images, &request.options).await?;
    Ok(Json(Analysis::Post(result)))
}

async fn chat_log(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ChatLogRequest>,
) -> AppResult<Json<Analysis>> {
    info!(user_id = %user.user_id, messages = request.chat.messages.len(), "Chat log request");

    let images = prepare_images(&request.images).await?;
    let result = ChatLogAgent::analyze_chat_log(&state.ai, &request.chat, images, &request.options).await?;
    Ok(Json(Analysis::ChatLog(result)))
}

async fn personality(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<PersonalityRequest>,
) -> AppResult<Json<Analysis>> {
    info!(user_id = %user.user_id, "Personality request");

    let images = prepare_images(&request.images).await?;
    let result =
        PersonalityAgent::analyze_personality(&state.ai, &request.input, images, &request.options)
            .await?;
    Ok(Json(Analysis::Personality(result)))
}

async fn avatar(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<AvatarRequest>,
) -> AppResult<Json<Analysis>> {
    info!(user_id = %user.user_id, "Avatar request");

    let image = prepare_image(&request.image).await?;
    let result = ProfileAgent::analyze_avatar(&state.ai, image, &request.options).await?;
    Ok(Json(Analysis::Avatar(result)))
}

async fn persona_reply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<PersonaReplyRequest>,
) -> AppResult<Json<PersonaReplyResponse>> {
    info!(user_id = %user.user_id, history = request.history.len(), "Persona reply request");

    let reply = PersonaAgent::generate_persona_reply(
        &state.ai,
        &request.persona,
        &request.history,
        &request.message,
        &request.options,
    )
    .await?;
    Ok(Json(PersonaReplyResponse { reply }))
}
