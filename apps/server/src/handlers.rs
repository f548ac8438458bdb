//! HTTP route handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vidprompt_core::{
    ChatMessage, ChatRequest, CompletionClient, CompletionRequest, Error, Relay, RelayConfig,
    VideoLookup, VideoStore, compose_prompt, cors::add_cors,
};

use super::response::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VideoStore>,
    pub client: Arc<dyn CompletionClient>,
    pub model: String,
    pub relay: RelayConfig,
}

/// Handle POST /ai/generate
///
/// Everything up to the first completion chunk can still fail with a JSON
/// error; after that the response belongs to the [`Relay`].
#[tracing::instrument(skip_all, fields(video_id = tracing::field::Empty))]
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Relay, ApiError> {
    let request = CompletionRequest::from_body(&body)?;
    let video_id = request.video_id;
    tracing::Span::current().record("video_id", tracing::field::display(video_id));

    let record = match state.store.find_video(video_id).await? {
        VideoLookup::Found(record) => record,
        VideoLookup::NotFound => return Err(Error::VideoNotFound { video_id }.into()),
    };
    let Some(transcript) = record.transcript.as_deref().filter(|t| !t.is_empty()) else {
        return Err(Error::MissingTranscript { video_id }.into());
    };

    let chat = ChatRequest {
        model: state.model.clone(),
        temperature: request.temperature,
        messages: vec![ChatMessage::user(compose_prompt(
            &request.prompt,
            transcript,
        ))],
    };

    let upstream = state.client.stream_completion(&chat).await?;
    let relay = Relay::start(upstream, &state.relay).await?;
    tracing::info!(model = %chat.model, temperature = chat.temperature, "streaming completion");

    Ok(relay)
}

/// Handle OPTIONS /ai/generate (CORS preflight)
pub async fn handle_preflight() -> Response {
    add_cors(StatusCode::NO_CONTENT.into_response())
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
