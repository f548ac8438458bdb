//! Streaming chat completions from OpenAI-compatible APIs.

use std::{fmt::Display, future, pin::Pin};

use async_trait::async_trait;
use eventsource_stream::{Event, Eventsource};
use futures::{Stream, StreamExt};

use crate::{
    error::{Error, Result},
    provider::Provider,
    types::ChatRequest,
};

/// Text deltas in arrival order. Dropping the stream cancels the upstream call.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a streaming completion.
    ///
    /// Fails if the request cannot be sent or is rejected; errors after that
    /// point arrive as items of the returned stream.
    async fn stream_completion(&self, request: &ChatRequest) -> Result<ChunkStream>;
}

pub struct OpenAiCompatClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OpenAiCompatClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client for `provider`, reading its API key from the environment.
    pub fn from_provider(provider: &Provider) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        Ok(Self::new(provider.config().api_url, api_key))
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn stream_completion(&self, request: &ChatRequest) -> Result<ChunkStream> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": request.model,
                "temperature": request.temperature,
                "messages": request.messages,
                "stream": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(format!("{status}: {}", body.trim())));
        }

        tracing::debug!(model = %request.model, "completion stream opened");
        Ok(Box::pin(text_deltas(response.bytes_stream().eventsource())))
    }
}

#[derive(Debug, PartialEq)]
enum SseDelta {
    Text(String),
    Empty,
    Done,
}

/// Turn a stream of SSE events into text deltas, ending at `[DONE]`.
fn text_deltas<S, E>(events: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Event, E>> + Send,
    E: Display,
{
    events
        .map(|event| match event {
            Ok(event) => parse_event_data(&event.data),
            Err(e) => Err(Error::upstream(format!("event stream: {e}"))),
        })
        .take_while(|item| future::ready(!matches!(item, Ok(SseDelta::Done))))
        .filter_map(|item| {
            future::ready(match item {
                Ok(SseDelta::Text(text)) => Some(Ok(text)),
                Ok(SseDelta::Empty | SseDelta::Done) => None,
                Err(e) => Some(Err(e)),
            })
        })
}

fn parse_event_data(data: &str) -> Result<SseDelta> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseDelta::Done);
    }

    let chunk: serde_json::Value = serde_json::from_str(data)
        .map_err(|e| Error::upstream(format!("malformed stream event: {e}")))?;

    if let Some(err) = chunk.get("error") {
        let message = err["message"].as_str().unwrap_or("unknown error");
        return Err(Error::upstream(message.to_string()));
    }

    match chunk["choices"][0]["delta"]["content"].as_str() {
        Some(text) if !text.is_empty() => Ok(SseDelta::Text(text.to_string())),
        _ => Ok(SseDelta::Empty),
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{Router, http::StatusCode, routing::post};
    use futures::stream;

    use super::*;
    use crate::types::ChatMessage;

    fn sse(body: &'static str) -> impl Stream<Item = std::result::Result<Event, String>> + Send {
        stream::iter(vec![Ok::<_, std::io::Error>(body.as_bytes().to_vec())])
            .eventsource()
            .map(|event| event.map_err(|e| e.to_string()))
    }

    async fn collect(events: impl Stream<Item = std::result::Result<Event, String>> + Send) -> Vec<Result<String>> {
        text_deltas(events).collect().await
    }

    fn chat_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-test".into(),
            temperature: 0.5,
            messages: vec![ChatMessage::user("hello")],
        }
    }

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    #[test]
    fn should_parse_delta_content() {
        let data = r#"{"choices":[{"index":0,"delta":{"content":"Hel"}}]}"#;

        assert_eq!(parse_event_data(data).unwrap(), SseDelta::Text("Hel".into()));
    }

    #[test]
    fn should_skip_role_only_and_finish_deltas() {
        let role = r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}"#;
        let finish = r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;

        assert_eq!(parse_event_data(role).unwrap(), SseDelta::Empty);
        assert_eq!(parse_event_data(finish).unwrap(), SseDelta::Empty);
    }

    #[test]
    fn should_surface_inline_api_errors() {
        let data = r#"{"error":{"message":"model overloaded","type":"server_error"}}"#;

        let err = parse_event_data(data).unwrap_err();

        assert!(matches!(err, Error::Upstream { reason } if reason == "model overloaded"));
    }

    #[tokio::test]
    async fn should_emit_deltas_until_done() {
        // given
        let events = sse(concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ));

        // when
        let items = collect(events).await;

        // then
        let texts: Vec<String> = items.into_iter().map(|i| i.unwrap()).collect();
        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn should_fail_on_malformed_event() {
        let events = sse(concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
            "data: {not json\n\n",
        ));

        let items = collect(events).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "ok");
        assert!(matches!(items[1], Err(Error::Upstream { .. })));
    }

    #[tokio::test]
    async fn should_stream_from_http_endpoint() {
        // given
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|body: String| async move {
                assert!(body.contains(r#""stream":true"#));
                assert!(body.contains(r#""role":"user""#));
                (
                    [("content-type", "text/event-stream")],
                    concat!(
                        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
                        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
                        "data: [DONE]\n\n",
                    ),
                )
            }),
        );
        let addr = serve(app).await;
        let client = OpenAiCompatClient::new(format!("http://{addr}/v1/chat/completions"), "sk-test");

        // when
        let stream = client.stream_completion(&chat_request()).await.unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;

        // then
        assert_eq!(chunks.concat(), "Hello");
    }

    #[tokio::test]
    async fn should_reject_non_success_status_before_streaming() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
        );
        let addr = serve(app).await;
        let client = OpenAiCompatClient::new(format!("http://{addr}/v1/chat/completions"), "bad");

        let err = match client.stream_completion(&chat_request()).await {
            Ok(_) => panic!("expected upstream error"),
            Err(e) => e,
        };

        assert!(matches!(err, Error::Upstream { reason } if reason.contains("401")));
    }
}
