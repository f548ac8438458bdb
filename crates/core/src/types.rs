use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default sampling temperature when the request omits one.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// A validated `/ai/generate` request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub video_id: Uuid,
    pub prompt: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: Uuid,
    pub transcript: Option<String>,
}

/// Outcome of a record lookup. A missing record is not an error here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoLookup {
    Found(VideoRecord),
    NotFound,
}

/// Transcript file written by the transcription pipeline.
#[derive(Debug, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Input to a streaming chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}
