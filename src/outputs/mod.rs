//! Output generation: stage JSON files and the Markdown summary report.
//!
//! # Submodules
//!
//! - [`json`]: the per-run directory and its stage JSON files
//! - [`markdown`]: renders summarized articles to `summaries.md`

pub mod json;
pub mod markdown;
