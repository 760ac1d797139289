//! Progress reporting around a running generation

use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use crate::error::{AppError, Result};
use crate::response::{MediaResponse, ProviderInfo};

/// Label and elapsed time of a status event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressStatus {
    pub label: String,
    /// Elapsed seconds, formatted as `1.23s`
    pub status: String,
    pub elapsed_ms: u64,
}

impl ProgressStatus {
    fn new(label: &str, elapsed: Duration) -> Self {
        Self {
            label: label.to_string(),
            status: format!("{:.2}s", elapsed.as_secs_f64()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Events delivered to the caller, in this order: any number of `Progress`,
/// then `Finished`, `Provider` and `Media`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum GenerationEvent {
    Progress(ProgressStatus),
    Finished(ProgressStatus),
    Provider(ProviderInfo),
    Media(MediaResponse),
}

impl GenerationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GenerationEvent::Progress(_) => "progress",
            GenerationEvent::Finished(_) => "finished",
            GenerationEvent::Provider(_) => "provider",
            GenerationEvent::Media(_) => "media",
        }
    }
}

type Outcome = Result<(ProviderInfo, MediaResponse)>;

enum Phase {
    Running {
        handle: JoinHandle<Outcome>,
        ticker: Interval,
        started: Instant,
    },
    Draining(VecDeque<GenerationEvent>),
    Done,
}

/// Run `work` as a spawned task and report on it.
///
/// While the task runs, a `Progress` event is yielded on every tick. Task
/// completion is checked before the timer, so no progress event follows it.
/// Dropping the stream detaches the task, which keeps running.
pub fn with_progress<F>(work: F, interval: Duration) -> BoxStream<'static, Result<GenerationEvent>>
where
    F: Future<Output = Outcome> + Send + 'static,
{
    let started = Instant::now();
    let handle = tokio::spawn(work);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let phase = Phase::Running {
        handle,
        ticker,
        started,
    };

    stream::unfold(phase, |phase| async move {
        match phase {
            Phase::Running {
                mut handle,
                mut ticker,
                started,
            } => {
                let joined = tokio::select! {
                    biased;
                    joined = &mut handle => Some(joined),
                    _ = ticker.tick() => None,
                };

                let Some(joined) = joined else {
                    let event = GenerationEvent::Progress(ProgressStatus::new("Generating", started.elapsed()));
                    return Some((Ok(event), Phase::Running { handle, ticker, started }));
                };

                let outcome = joined.unwrap_or_else(|e| {
                    Err(AppError::Internal(format!("Generation task failed: {}", e)))
                });

                match outcome {
                    Ok((info, media)) => {
                        let finished = GenerationEvent::Finished(ProgressStatus::new("Finished", started.elapsed()));
                        let rest = VecDeque::from(vec![
                            GenerationEvent::Provider(info),
                            GenerationEvent::Media(media),
                        ]);
                        Some((Ok(finished), Phase::Draining(rest)))
                    }
                    Err(e) => Some((Err(e), Phase::Done)),
                }
            }
            Phase::Draining(mut rest) => rest
                .pop_front()
                .map(|event| (Ok(event), Phase::Draining(rest))),
            Phase::Done => None,
        }
    })
    .boxed()
}

/// Drain a generation stream, keeping only the final provider info and media
pub async fn collect_outcome(
    mut events: BoxStream<'static, Result<GenerationEvent>>,
) -> Result<(ProviderInfo, MediaResponse)> {
    let mut provider = None;
    let mut media = None;

    while let Some(event) = events.next().await {
        match event? {
            GenerationEvent::Provider(info) => provider = Some(info),
            GenerationEvent::Media(result) => media = Some(result),
            GenerationEvent::Progress(_) | GenerationEvent::Finished(_) => {}
        }
    }

    provider
        .zip(media)
        .ok_or_else(|| AppError::Internal("Generation ended without a result".to_string()))
}
