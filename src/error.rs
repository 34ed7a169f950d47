//! Named pipeline failures.
//!
//! Most errors travel as `Box<dyn Error>` and are only logged. The variants
//! here are the ones callers (and tests) need to tell apart.

use std::path::PathBuf;
use thiserror::Error;

/// Failures the pipeline names explicitly. Everything else travels as a boxed error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The news section was still missing after the operator's login attempt.
    #[error("portfolio news section not found after manual login; giving up")]
    FeedUnavailable,

    /// Summarization was requested without credentials.
    #[error("summarization is enabled but no API key was provided (set DEEPSEEK_API_KEY)")]
    MissingApiKey,

    /// The summarization service answered with a non-success status.
    ///
    /// `body` is already truncated for logging.
    #[error("summarization request failed with status {status}: {body}")]
    Summarization { status: u16, body: String },

    #[error("summarization response contained no choices")]
    EmptyCompletion,

    /// Browser launch or configuration failure.
    #[error("browser error: {0}")]
    Browser(String),

    /// A fresh run would reuse a directory that already exists.
    #[error("run directory {0} already exists; pass --resume to continue it")]
    RunDirExists(PathBuf),
}
