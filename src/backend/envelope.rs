//! JSON response envelopes returned by the providers

use serde_json::Value;

use crate::catalog::Task;
use crate::error::{AppError, Result};
use crate::response::MediaResponse;

/// Convert a JSON provider answer into a media result.
///
/// Precedence: a `video.url` field, then `images`/`data` for image tasks,
/// then `output` for video tasks.
pub fn parse_media_json(body: &Value, task: &Task, prompt: &str) -> Result<MediaResponse> {
    if let Some(video) = body.get("video") {
        let url = video
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::BackendError("Video result has no url".to_string()))?;
        return Ok(MediaResponse::video(url, prompt));
    }

    match task {
        Task::TextToImage => {
            let items = body
                .get("images")
                .or_else(|| body.get("data"))
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    AppError::BackendError("Image result has neither images nor data".to_string())
                })?;

            let urls = items
                .iter()
                .map(|item| {
                    item.get("url")
                        .and_then(Value::as_str)
                        .map(String::from)
                        .ok_or_else(|| AppError::BackendError("Image entry has no url".to_string()))
                })
                .collect::<Result<Vec<_>>>()?;

            if urls.is_empty() {
                return Err(AppError::BackendError("Image result is empty".to_string()));
            }
            Ok(MediaResponse::image(urls, prompt))
        }
        Task::TextToVideo => {
            let url = match body.get("output") {
                Some(Value::String(url)) => Some(url.as_str()),
                Some(Value::Array(items)) => items.iter().find_map(Value::as_str),
                _ => None,
            }
            .ok_or_else(|| AppError::BackendError("Video result has no output".to_string()))?;
            Ok(MediaResponse::video(url, prompt))
        }
        Task::Other(name) => Err(AppError::ModelNotSupported(format!("task {}", name))),
    }
}
