//! Persistence of binary media bodies

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::catalog::Task;
use crate::config::StorageConfig;
use crate::error::Result;
use crate::response::media::MediaResponse;

/// Content types treated as a raw media body rather than a JSON envelope
pub fn is_media_content_type(content_type: &str) -> bool {
    let mime = essence(content_type);
    mime.starts_with("image/")
        || mime.starts_with("video/")
        || mime.starts_with("audio/")
        || mime == "application/octet-stream"
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extension_for(content_type: &str) -> &'static str {
    match essence(content_type).as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        _ => "bin",
    }
}

/// Stores a binary media body and describes where it ended up
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn persist(
        &self,
        body: &[u8],
        content_type: &str,
        task: &Task,
        prompt: &str,
    ) -> Result<MediaResponse>;
}

/// Writes media to a local directory served under a public URL prefix
pub struct FileMediaStore {
    base_path: PathBuf,
    url_prefix: String,
}

impl FileMediaStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            base_path: PathBuf::from(&config.base_path),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn file_name(content_type: &str) -> String {
        format!(
            "{}_{}.{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4().simple(),
            extension_for(content_type)
        )
    }
}

#[async_trait]
impl MediaStore for FileMediaStore {
    async fn persist(
        &self,
        body: &[u8],
        content_type: &str,
        task: &Task,
        prompt: &str,
    ) -> Result<MediaResponse> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        let file_name = Self::file_name(content_type);
        let path = self.base_path.join(&file_name);
        tokio::fs::write(&path, body).await?;

        let url = format!("{}/{}", self.url_prefix, file_name);
        info!(path = %path.display(), bytes = body.len(), "Stored media");

        let mime = essence(content_type);
        let is_video = mime.starts_with("video/") || (!mime.starts_with("image/") && task.is_video());
        Ok(if is_video {
            MediaResponse::video(url, prompt)
        } else {
            MediaResponse::image(vec![url], prompt)
        })
    }
}
