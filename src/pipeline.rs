//! Pipeline orchestration.
//!
//! # Stages
//!
//! 1. **Feed**: load the portfolio feed; if it is missing, ask the operator to
//!    log in and retry exactly once ([`acquire_feed`])
//! 2. **Enrich**: open each stub's article and merge the fields, skipping
//!    stubs without a url and articles that cannot be parsed ([`enrich`])
//! 3. **Select**: operator keep/skip/stop ([`crate::select::select_articles`])
//! 4. **Summarize**: one summarization call per selected article ([`summarize`])
//! 5. **Markdown**: `summaries.md`
//!
//! Each stage's output is saved to the run directory before the next stage
//! starts. When the run directory already holds a stage's file, [`run`] loads
//! it instead of redoing the work, and only launches the browser if the feed
//! or enrichment stage actually has to run.

use crate::api::Summarize;
use crate::config::PipelineSettings;
use crate::console::Console;
use crate::driver::PageDriver;
use crate::error::PipelineError;
use crate::models::{EnrichedArticle, NewsStub, SelectedArticle, SummarizedArticle};
use crate::observer::{PipelineEvent, PipelineObserver, SkipReason};
use crate::outputs::json::{RunDir, Stage};
use crate::outputs::markdown::summaries_to_markdown;
use crate::scrapers::article::{ArticleOutcome, extract_article};
use crate::scrapers::feed::load_feed;
use crate::select::select_articles;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use tracing::{error, info, instrument};

const LOGIN_PROMPT: &str = "Please log in (if not already). Then press Enter to continue...";

/// Counts from a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Feed stubs; `None` when enrichment was resumed and the feed never loaded.
    pub stubs: Option<usize>,
    pub enriched: usize,
    pub selected: usize,
    /// `None` when summarization is disabled.
    pub summarized: Option<usize>,
}

/// Load the feed, with one operator-assisted retry.
///
/// A missing feed section nearly always means the session expired. The
/// operator gets one chance to log in; a second miss is
/// [`PipelineError::FeedUnavailable`].
///
/// # Arguments
///
/// * `driver` - Browser session with the persistent profile
/// * `console` - Used for the login pause; untouched when the feed loads
/// * `observer` - Receives feed and login events
/// * `settings` - Feed url, timeouts and scroll budget
///
/// # Errors
///
/// Returns [`PipelineError::FeedUnavailable`] after the second miss, or any
/// driver or console error.
#[instrument(level = "info", skip_all)]
pub async fn acquire_feed<D, C, O>(
    driver: &mut D,
    console: &mut C,
    observer: &O,
    settings: &PipelineSettings,
) -> Result<Vec<NewsStub>, Box<dyn Error>>
where
    D: PageDriver,
    C: Console,
    O: PipelineObserver,
{
    if let Some(stubs) = load_feed(driver, settings).await? {
        observer.on_event(&PipelineEvent::FeedLoaded { stubs: stubs.len() });
        return Ok(stubs);
    }
    observer.on_event(&PipelineEvent::FeedMissing { attempt: 1 });

    observer.on_event(&PipelineEvent::LoginRequested);
    console.read_line(LOGIN_PROMPT).await?;

    match load_feed(driver, settings).await? {
        Some(stubs) => {
            observer.on_event(&PipelineEvent::FeedLoaded { stubs: stubs.len() });
            Ok(stubs)
        }
        None => {
            observer.on_event(&PipelineEvent::FeedMissing { attempt: 2 });
            Err(PipelineError::FeedUnavailable.into())
        }
    }
}

/// Open each stub's article and build the enriched list.
///
/// Stubs without a url, external articles and structure mismatches are
/// reported and left out. Indices of the result are `1..=n` with no gaps.
///
/// # Arguments
///
/// * `driver` - Browser session, already past the feed stage
/// * `observer` - Receives one event per stub
/// * `settings` - Article waits and the optional article cap
/// * `stubs` - Feed stubs, in feed order
///
/// # Errors
///
/// A driver failure (navigation error, crashed browser, lost connection)
/// ends enrichment with that error. Nothing is returned for the stubs
/// already processed, so a broken session is never saved as a finished
/// enrichment stage and `--resume` redoes the whole stage.
#[instrument(level = "info", skip_all, fields(stubs = stubs.len()))]
pub async fn enrich<D, O>(
    driver: &mut D,
    observer: &O,
    settings: &PipelineSettings,
    stubs: &[NewsStub],
) -> Result<Vec<EnrichedArticle>, Box<dyn Error>>
where
    D: PageDriver,
    O: PipelineObserver,
{
    let mut enriched = Vec::new();

    for stub in stubs {
        if let Some(cap) = settings.max_articles {
            if enriched.len() >= cap {
                observer.on_event(&PipelineEvent::EnrichCapped { cap });
                break;
            }
        }

        let Some(url) = stub.url.as_deref() else {
            observer.on_event(&PipelineEvent::StubSkipped { index: stub.index });
            continue;
        };

        let reason = match extract_article(driver, url, &settings.article_waits).await {
            Ok(ArticleOutcome::Parsed(record)) => {
                let index = enriched.len() + 1;
                enriched.push(EnrichedArticle::merge(index, stub, url, record));
                observer.on_event(&PipelineEvent::ArticleEnriched { index, url });
                continue;
            }
            Ok(ArticleOutcome::External) => SkipReason::External,
            Ok(ArticleOutcome::StructureMismatch) => SkipReason::StructureMismatch,
            Err(e) => {
                error!(
                    %url,
                    index = stub.index,
                    enriched = enriched.len(),
                    error = %e,
                    "Browser failed while opening article; aborting enrichment"
                );
                return Err(e);
            }
        };
        observer.on_event(&PipelineEvent::ArticleSkipped { url, reason });
    }

    info!(
        stubs = stubs.len(),
        enriched = enriched.len(),
        "Collected articles with content"
    );
    Ok(enriched)
}

/// Summarize each selected article in order. The first failure aborts.
///
/// # Returns
///
/// One [`SummarizedArticle`] per input, in the same order.
///
/// # Errors
///
/// The first summarizer error, unchanged. Summaries already produced are
/// discarded with it.
#[instrument(level = "info", skip_all, fields(count = selected.len()))]
pub async fn summarize<S, O>(
    summarizer: &S,
    observer: &O,
    selected: &[SelectedArticle],
) -> Result<Vec<SummarizedArticle>, Box<dyn Error>>
where
    S: Summarize,
    O: PipelineObserver,
{
    let total = selected.len();
    let mut summarized = Vec::with_capacity(total);

    for (i, article) in selected.iter().enumerate() {
        observer.on_event(&PipelineEvent::Summarizing {
            position: i + 1,
            total,
            title: article.display_title(),
        });
        let summary = summarizer
            .summarize(article.title.as_deref(), &article.content)
            .await?;
        summarized.push(SummarizedArticle {
            article: article.clone(),
            summary,
        });
    }

    Ok(summarized)
}

/// Save a stage and report it.
async fn save_stage<T, O>(
    run_dir: &RunDir,
    observer: &O,
    stage: Stage,
    items: &[T],
) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    O: PipelineObserver,
{
    let path = run_dir.save(stage, items).await?;
    observer.on_event(&PipelineEvent::StageSaved {
        stage,
        path: &path,
        items: items.len(),
    });
    Ok(())
}

/// Load a stage if it was saved, reporting it when it was.
async fn resume_stage<T, O>(
    run_dir: &RunDir,
    observer: &O,
    stage: Stage,
) -> Result<Option<Vec<T>>, Box<dyn Error>>
where
    T: DeserializeOwned,
    O: PipelineObserver,
{
    let loaded = run_dir.load::<T>(stage).await?;
    if let Some(items) = &loaded {
        observer.on_event(&PipelineEvent::StageResumed {
            stage,
            items: items.len(),
        });
    }
    Ok(loaded)
}

/// Run every enabled stage, persisting as it goes.
///
/// `launch` opens the browser session. It is only called when the feed or
/// enrichment stage has to run, and the session is dropped as soon as
/// enrichment ends, or earlier if a stage fails.
///
/// # Arguments
///
/// * `launch` - Opens the browser; called at most once
/// * `console` - Operator I/O for login and selection
/// * `summarizer` - Required only if summarization actually runs
/// * `observer` - Receives every [`PipelineEvent`]
/// * `settings` - Timeouts, caps and enabled stages
/// * `run_dir` - Where stages are saved and resumed from
///
/// # Errors
///
/// Any stage error ends the run. Stage files written before the failure
/// stay on disk for `--resume`; the failing stage writes nothing.
#[instrument(level = "info", skip_all, fields(run_dir = %run_dir.path().display()))]
pub async fn run<D, L, C, S, O>(
    launch: L,
    console: &mut C,
    summarizer: Option<&S>,
    observer: &O,
    settings: &PipelineSettings,
    run_dir: &RunDir,
) -> Result<RunReport, Box<dyn Error>>
where
    D: PageDriver,
    L: FnOnce() -> Result<D, Box<dyn Error>>,
    C: Console,
    S: Summarize,
    O: PipelineObserver,
{
    let mut report = RunReport::default();

    let enriched = match resume_stage::<EnrichedArticle, _>(run_dir, observer, Stage::Enriched).await? {
        Some(enriched) => enriched,
        None => {
            let mut driver = launch()?;

            let stubs = match resume_stage::<NewsStub, _>(run_dir, observer, Stage::Feed).await? {
                Some(stubs) => stubs,
                None => {
                    let stubs = acquire_feed(&mut driver, console, observer, settings).await?;
                    save_stage(run_dir, observer, Stage::Feed, &stubs).await?;
                    stubs
                }
            };
            report.stubs = Some(stubs.len());

            let enriched = enrich(&mut driver, observer, settings, &stubs).await?;
            drop(driver);
            save_stage(run_dir, observer, Stage::Enriched, &enriched).await?;
            enriched
        }
    };
    report.enriched = enriched.len();

    let selected = match resume_stage::<SelectedArticle, _>(run_dir, observer, Stage::Selected).await? {
        Some(selected) => selected,
        None => {
            let selected = if settings.stages.select {
                select_articles(console, &enriched).await?
            } else {
                enriched
            };
            save_stage(run_dir, observer, Stage::Selected, &selected).await?;
            selected
        }
    };
    report.selected = selected.len();

    if settings.stages.summarize {
        let summarized = match resume_stage::<SummarizedArticle, _>(run_dir, observer, Stage::Summarized).await? {
            Some(summarized) => summarized,
            None if selected.is_empty() => {
                info!("No articles were selected for summarization");
                Vec::new()
            }
            None => {
                let summarizer = summarizer.ok_or(PipelineError::MissingApiKey)?;
                let summarized = summarize(summarizer, observer, &selected).await?;
                save_stage(run_dir, observer, Stage::Summarized, &summarized).await?;
                summarized
            }
        };
        report.summarized = Some(summarized.len());

        if settings.stages.markdown && !summarized.is_empty() {
            run_dir
                .write_markdown(&summaries_to_markdown(&summarized))
                .await?;
        }
    }

    observer.on_event(&PipelineEvent::RunCompleted {
        path: run_dir.path(),
    });
    Ok(report)
}
