//! Relay of a completion stream into an HTTP response body.
//!
//! A relay moves through `Idle -> Streaming -> {Completed | Aborted | Failed}`.
//! Nothing is committed to the client while idle: a failure before the first
//! chunk is returned to the caller, which can still answer with a structured
//! error. Once the first chunk arrives the response head (200, CORS) is built
//! exactly once and a forwarding task owns the upstream stream until one of
//! the terminal states is reached. After that point the only way to signal an
//! upstream failure is to abort the body.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::{StreamExt, future, stream};
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use crate::{
    completion::ChunkStream,
    cors::add_cors,
    error::{Error, Result},
};

pub const STREAM_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Streaming,
    Completed,
    /// The client went away; upstream was cancelled.
    Aborted,
    /// Upstream failed after the response was committed.
    Failed,
}

impl RelayState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RelayState::Completed | RelayState::Aborted | RelayState::Failed
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    /// Longest wait for the next upstream chunk. `None` waits indefinitely.
    pub idle_timeout: Option<Duration>,
}

/// A committed streaming response.
pub struct Relay {
    response: Response,
    state: watch::Receiver<RelayState>,
}

impl Relay {
    /// Wait for the first upstream chunk and commit the response.
    ///
    /// Errors returned here happened before anything was sent to the client.
    pub async fn start(mut upstream: ChunkStream, config: &RelayConfig) -> Result<Self> {
        let (state_tx, state) = watch::channel(RelayState::Idle);

        let first = match next_chunk(&mut upstream, config.idle_timeout).await? {
            Some(chunk) => chunk,
            None => {
                state_tx.send_replace(RelayState::Completed);
                tracing::info!(chunks = 0, bytes = 0, "completion stream completed");
                return Ok(Self {
                    response: commit(Body::empty()),
                    state,
                });
            }
        };

        // One slot: a chunk waiting for the client holds back the next pull.
        let (tx, rx) = mpsc::channel::<Result<Bytes>>(1);
        let mut stats = RelayStats::default();
        stats.record(&first);

        state_tx.send_replace(RelayState::Streaming);
        tokio::spawn(
            forward(upstream, tx, config.idle_timeout, state_tx, stats).in_current_span(),
        );

        let body = stream::once(future::ready(Ok(Bytes::from(first)))).chain(stream::unfold(
            rx,
            |mut rx| async move { rx.recv().await.map(|item| (item, rx)) },
        ));

        Ok(Self {
            response: commit(Body::from_stream(body)),
            state,
        })
    }

    pub fn state(&self) -> RelayState {
        *self.state.borrow()
    }

    /// Watch the relay's state, e.g. to await its terminal outcome.
    pub fn subscribe(&self) -> watch::Receiver<RelayState> {
        self.state.clone()
    }
}

impl IntoResponse for Relay {
    fn into_response(self) -> Response {
        self.response
    }
}

fn commit(body: Body) -> Response {
    add_cors(
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            body,
        )
            .into_response(),
    )
}

#[derive(Debug, Default)]
struct RelayStats {
    chunks: usize,
    bytes: usize,
}

impl RelayStats {
    fn record(&mut self, chunk: &str) {
        self.chunks += 1;
        self.bytes += chunk.len();
    }
}

async fn next_chunk(
    upstream: &mut ChunkStream,
    idle_timeout: Option<Duration>,
) -> Result<Option<String>> {
    let next = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, upstream.next())
            .await
            .map_err(|_| Error::upstream(format!("no data from completion API within {limit:?}")))?,
        None => upstream.next().await,
    };
    next.transpose()
}

/// Writer loop: pull, forward, repeat. Owns `upstream` and `tx`, so both are
/// released on every exit.
async fn forward(
    mut upstream: ChunkStream,
    tx: mpsc::Sender<Result<Bytes>>,
    idle_timeout: Option<Duration>,
    state: watch::Sender<RelayState>,
    mut stats: RelayStats,
) {
    let outcome = loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => break RelayState::Aborted,
            next = next_chunk(&mut upstream, idle_timeout) => next,
        };

        match next {
            Ok(Some(chunk)) => {
                stats.record(&chunk);
                if tx.send(Ok(Bytes::from(chunk))).await.is_err() {
                    break RelayState::Aborted;
                }
            }
            Ok(None) => break RelayState::Completed,
            Err(e) => {
                tracing::warn!(error = %e, "completion stream failed mid-response");
                // Yielding an error makes hyper abort the body.
                let _ = tx.send(Err(e)).await;
                break RelayState::Failed;
            }
        }
    };

    drop(upstream);
    drop(tx);

    match outcome {
        RelayState::Completed => tracing::info!(
            chunks = stats.chunks,
            bytes = stats.bytes,
            "completion stream completed"
        ),
        RelayState::Aborted => tracing::debug!(
            chunks = stats.chunks,
            bytes = stats.bytes,
            "client disconnected, upstream cancelled"
        ),
        _ => tracing::warn!(
            chunks = stats.chunks,
            bytes = stats.bytes,
            "completion stream aborted after failure"
        ),
    }
    state.send_replace(outcome);
}
