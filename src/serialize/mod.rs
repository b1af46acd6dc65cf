//! Canonical model → RSS 2.0, Atom 1.0 or JSON Feed 1.1 text.
//!
//! Re-parsing RSS or Atom output with [`crate::feed::parse`] recovers the
//! same titles, links, descriptions, categories, authors and enclosures.
//! Byte-for-byte reproduction of the original source is not a goal.

mod atom;
mod json;
mod rss;
mod xml;

use serde::Deserialize;
use thiserror::Error;

use crate::model::ParsedFeed;

pub use atom::to_atom;
pub use json::{to_json, JSON_FEED_VERSION};
pub use rss::to_rss;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Failed to write XML: {0}")]
    Xml(String),
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Generated document contains invalid UTF-8")]
    InvalidUtf8,
}

/// Output format selectable from the CLI and the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Rss,
    Atom,
    Json,
}

/// Renders `feed` in `format`.
pub fn serialize(feed: &ParsedFeed, format: OutputFormat) -> Result<String, SerializeError> {
    match format {
        OutputFormat::Rss => to_rss(feed),
        OutputFormat::Atom => to_atom(feed),
        OutputFormat::Json => to_json(feed),
    }
}
