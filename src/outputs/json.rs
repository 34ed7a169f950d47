//! Run directory and stage JSON files.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-01-06 09.30.00/
//!     ├── news_list.json
//!     ├── final_news_list.json
//!     ├── selected_articles.json
//!     ├── summarized_articles.json
//!     └── summaries.md
//! ```
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! stage file is either absent or complete. That is what makes `--resume`
//! safe after a crash.
//!
//! A fresh run never reuses a directory: [`RunDir::create`] fails when the
//! timestamped directory already exists, so stage files from another run are
//! only picked up through [`RunDir::open`].

use crate::error::PipelineError;
use crate::utils::{ensure_writable_dir, run_dir_name};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// A pipeline stage with a persisted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Stubs read from the portfolio feed.
    Feed,
    /// Stubs merged with their article pages.
    Enriched,
    /// Articles the operator kept.
    Selected,
    /// Selected articles with their summaries.
    Summarized,
}

impl Stage {
    /// File name of this stage inside a run directory.
    ///
    /// These names are the on-disk contract for `--resume`; renaming one
    /// orphans existing run directories.
    pub fn file_name(self) -> &'static str {
        match self {
            Stage::Feed => "news_list.json",
            Stage::Enriched => "final_news_list.json",
            Stage::Selected => "selected_articles.json",
            Stage::Summarized => "summarized_articles.json",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Markdown digest written after summarization.
pub const MARKDOWN_FILE: &str = "summaries.md";

/// One run's output directory.
///
/// Obtained from [`RunDir::create`] for a new run or [`RunDir::open`] when
/// resuming. Either way the directory has been checked for writability.
#[derive(Debug, Clone)]
pub struct RunDir {
    path: PathBuf,
}

impl RunDir {
    /// Create a fresh timestamp-named directory under `base`.
    ///
    /// # Arguments
    ///
    /// * `base` - Parent directory; created if missing
    /// * `at` - Run start time, formatted by [`run_dir_name`]
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RunDirExists`] if a directory with the same
    /// name is already there (two runs started within the same second), or
    /// an I/O error if the directory cannot be created or written.
    #[instrument(level = "info", skip_all, fields(base = %base.display()))]
    pub async fn create(base: &Path, at: DateTime<Local>) -> Result<Self, Box<dyn Error>> {
        let path = base.join(run_dir_name(&at));
        fs::create_dir_all(base).await?;
        match fs::create_dir(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(PipelineError::RunDirExists(path).into());
            }
            Err(e) => return Err(e.into()),
        }
        ensure_writable_dir(&path).await?;
        info!(path = %path.display(), "Created run directory");
        Ok(Self { path })
    }

    /// Reopen an existing run directory.
    ///
    /// # Errors
    ///
    /// Fails if `path` does not exist, is not a directory, or is not writable.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !fs::metadata(path).await?.is_dir() {
            return Err(format!("{} is not a directory", path.display()).into());
        }
        ensure_writable_dir(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Location of the run directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a stage's items as pretty JSON, replacing any previous file.
    ///
    /// # Arguments
    ///
    /// * `stage` - Which stage file to write
    /// * `items` - The stage's records, written as one JSON array
    ///
    /// # Returns
    ///
    /// The path of the written file.
    #[instrument(level = "info", skip(self, items), fields(count = items.len()))]
    pub async fn save<T: Serialize>(&self, stage: Stage, items: &[T]) -> Result<PathBuf, Box<dyn Error>> {
        let json = serde_json::to_string_pretty(items)?;
        let path = self.path.join(stage.file_name());
        write_atomic(&path, json.as_bytes()).await?;
        info!(path = %path.display(), "Wrote stage file");
        Ok(path)
    }

    /// Read a stage's items back, or `None` if the stage has not been saved.
    ///
    /// # Errors
    ///
    /// A file that exists but does not parse as `Vec<T>` is an error, not
    /// `None`; a corrupt stage is never silently redone.
    pub async fn load<T: DeserializeOwned>(&self, stage: Stage) -> Result<Option<Vec<T>>, Box<dyn Error>> {
        let path = self.path.join(stage.file_name());
        if !fs::try_exists(&path).await? {
            debug!(path = %path.display(), "No saved stage file");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).await?;
        let items: Vec<T> = serde_json::from_str(&raw)?;
        Ok(Some(items))
    }

    /// Write the Markdown digest to [`MARKDOWN_FILE`], replacing any previous one.
    pub async fn write_markdown(&self, markdown: &str) -> Result<PathBuf, Box<dyn Error>> {
        let path = self.path.join(MARKDOWN_FILE);
        write_atomic(&path, markdown.as_bytes()).await?;
        info!(path = %path.display(), "Wrote Markdown file");
        Ok(path)
    }
}

/// Write to `<path>.tmp`, then rename over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
