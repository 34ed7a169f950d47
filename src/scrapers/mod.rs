//! Extractors for the finance portal.
//!
//! Extraction happens in two phases:
//!
//! 1. **Feed** ([`feed`]): scroll the portfolio page and turn each news item
//!    into a [`crate::models::NewsStub`]
//! 2. **Article** ([`article`]): open one stub's url, expand the story, and
//!    read it into a [`crate::models::ArticleRecord`]
//!
//! The selectors are tied to the portal's current markup (including its
//! generated `yf-*` class names) and will need updating when it changes.

pub mod article;
pub mod feed;
