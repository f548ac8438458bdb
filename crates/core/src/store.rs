//! Read-only access to stored video records.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::{
    error::Result,
    types::{Transcript, VideoLookup, VideoRecord},
};

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn find_video(&self, video_id: Uuid) -> Result<VideoLookup>;
}

/// In-process store, keyed by video id.
#[derive(Debug, Default)]
pub struct MemoryVideoStore {
    records: HashMap<Uuid, VideoRecord>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: VideoRecord) -> Self {
        self.records.insert(record.id, record);
        self
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn find_video(&self, video_id: Uuid) -> Result<VideoLookup> {
        Ok(match self.records.get(&video_id) {
            Some(record) => VideoLookup::Found(record.clone()),
            None => VideoLookup::NotFound,
        })
    }
}

/// Get the default root directory for stored videos
pub fn get_root_store_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vidprompt")
        .join("videos")
}

/// Get the directory holding a single video's artifacts
pub fn get_video_dir(root: &Path, video_id: Uuid) -> PathBuf {
    root.join(video_id.hyphenated().to_string())
}

/// Get the path for a video's transcript file
pub fn get_transcript_path(video_dir: &Path) -> PathBuf {
    video_dir.join("transcript.json")
}

/// Store backed by one directory per video.
///
/// `<root>/<video-id>/` marks the record as existing; its `transcript.json`
/// (if any) holds the transcript produced by the transcription pipeline.
#[derive(Debug, Clone)]
pub struct DiskVideoStore {
    root: PathBuf,
}

impl DiskVideoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl VideoStore for DiskVideoStore {
    async fn find_video(&self, video_id: Uuid) -> Result<VideoLookup> {
        let video_dir = get_video_dir(&self.root, video_id);
        if !fs::try_exists(&video_dir).await? {
            return Ok(VideoLookup::NotFound);
        }

        let transcript_path = get_transcript_path(&video_dir);
        let transcript = if fs::try_exists(&transcript_path).await? {
            let json_content = fs::read_to_string(&transcript_path).await?;
            let transcript: Transcript = serde_json::from_str(&json_content)?;
            Some(transcript.text)
        } else {
            None
        };

        Ok(VideoLookup::Found(VideoRecord {
            id: video_id,
            transcript,
        }))
    }
}
