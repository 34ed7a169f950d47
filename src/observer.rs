//! Pipeline event reporting.
//!
//! The orchestrator reports progress through a [`PipelineObserver`] instead of
//! writing to the console. [`TracingObserver`] turns each event into a
//! structured `tracing` record; tests inject a recorder.
//!
//! # Events
//!
//! | Event Kind | Description |
//! |------------|-------------|
//! | `feed.loaded` | Feed section found; stub count |
//! | `feed.missing` | Feed section not found on an attempt |
//! | `feed.login_requested` | Waiting for the operator to log in |
//! | `stub.skipped` | Feed item has no url |
//! | `article.enriched` | Article page parsed |
//! | `article.skipped` | Article classified External or StructureMismatch |
//! | `enrich.capped` | Configured article cap reached |
//! | `stage.saved` | Stage file written |
//! | `stage.resumed` | Stage loaded from an existing run directory |
//! | `summarize.started` | Summarizing one article |
//! | `run.completed` | All enabled stages finished |

use crate::outputs::json::Stage;
use std::path::Path;
use tracing::{info, warn};

/// Why an article was left out of the enriched list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No read-more control: hosted outside the portal's template.
    External,
    /// Content container missing: the template changed.
    StructureMismatch,
}

impl SkipReason {
    /// Stable label used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::External => "external",
            SkipReason::StructureMismatch => "structure_mismatch",
        }
    }
}

/// Something the pipeline did that an operator might want to see.
///
/// Events borrow from pipeline state and are only valid for the duration of
/// [`PipelineObserver::on_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent<'a> {
    FeedLoaded { stubs: usize },
    /// `attempt` is 1 before the login prompt, 2 after it.
    FeedMissing { attempt: u8 },
    LoginRequested,
    /// `index` is the stub's position in the feed.
    StubSkipped { index: usize },
    /// `index` is the article's position in the enriched list.
    ArticleEnriched { index: usize, url: &'a str },
    ArticleSkipped { url: &'a str, reason: SkipReason },
    EnrichCapped { cap: usize },
    StageSaved { stage: Stage, path: &'a Path, items: usize },
    StageResumed { stage: Stage, items: usize },
    /// `position` counts from 1 up to `total`.
    Summarizing { position: usize, total: usize, title: &'a str },
    RunCompleted { path: &'a Path },
}

impl PipelineEvent<'_> {
    /// Dotted event name, as listed in the module docs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::FeedLoaded { .. } => "feed.loaded",
            PipelineEvent::FeedMissing { .. } => "feed.missing",
            PipelineEvent::LoginRequested => "feed.login_requested",
            PipelineEvent::StubSkipped { .. } => "stub.skipped",
            PipelineEvent::ArticleEnriched { .. } => "article.enriched",
            PipelineEvent::ArticleSkipped { .. } => "article.skipped",
            PipelineEvent::EnrichCapped { .. } => "enrich.capped",
            PipelineEvent::StageSaved { .. } => "stage.saved",
            PipelineEvent::StageResumed { .. } => "stage.resumed",
            PipelineEvent::Summarizing { .. } => "summarize.started",
            PipelineEvent::RunCompleted { .. } => "run.completed",
        }
    }
}

/// Receiver for [`PipelineEvent`]s.
///
/// Called synchronously from the pipeline; implementations should not block.
pub trait PipelineObserver {
    fn on_event(&self, event: &PipelineEvent<'_>);
}

/// Forwards events to `tracing`.
///
/// Skips and misses are logged at `warn`, everything else at `info`. Every
/// record carries an `event_kind` field with [`PipelineEvent::kind`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        let event_kind = event.kind();
        match *event {
            PipelineEvent::FeedLoaded { stubs } => {
                info!(event_kind, stubs, "Found portfolio news")
            }
            PipelineEvent::FeedMissing { attempt } => {
                warn!(event_kind, attempt, "Could not find the portfolio news; possibly not logged in")
            }
            PipelineEvent::LoginRequested => info!(event_kind, "Waiting for manual login"),
            PipelineEvent::StubSkipped { index } => {
                warn!(event_kind, index, "Skipping feed item without a url")
            }
            PipelineEvent::ArticleEnriched { index, url } => {
                info!(event_kind, index, url, "Article enriched")
            }
            PipelineEvent::ArticleSkipped { url, reason } => {
                warn!(event_kind, url, reason = reason.as_str(), "Article skipped")
            }
            PipelineEvent::EnrichCapped { cap } => {
                info!(event_kind, cap, "Article cap reached; not opening more articles")
            }
            PipelineEvent::StageSaved { stage, path, items } => {
                info!(event_kind, %stage, path = %path.display(), items, "Stage saved")
            }
            PipelineEvent::StageResumed { stage, items } => {
                info!(event_kind, %stage, items, "Stage loaded from run directory")
            }
            PipelineEvent::Summarizing { position, total, title } => {
                info!(event_kind, position, total, title, "Summarizing article")
            }
            PipelineEvent::RunCompleted { path } => {
                info!(event_kind, path = %path.display(), "Run complete")
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kinds_are_stable() {
        assert_eq!(PipelineEvent::LoginRequested.kind(), "feed.login_requested");
        assert_eq!(
            PipelineEvent::ArticleSkipped {
                url: "u",
                reason: SkipReason::External
            }
            .kind(),
            "article.skipped"
        );
        assert_eq!(SkipReason::StructureMismatch.as_str(), "structure_mismatch");
    }

    #[test]
    fn test_tracing_observer_accepts_every_event() {
        let observer = TracingObserver;
        let path = Path::new("/tmp/run");
        for event in [
            PipelineEvent::FeedLoaded { stubs: 2 },
            PipelineEvent::FeedMissing { attempt: 1 },
            PipelineEvent::StageSaved {
                stage: Stage::Feed,
                path,
                items: 2,
            },
            PipelineEvent::RunCompleted { path },
        ] {
            observer.on_event(&event);
        }
    }
}
