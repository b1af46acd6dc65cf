//! Item enrichment: full-text scraping and reading-time metadata.
//!
//! - [`Enhancer`] fetches each item's page concurrently and swaps in the
//!   extracted article HTML when the feed only carried a summary
//! - [`extract_metadata`] is a pure pass that appends reading time to
//!   descriptions

mod enhancer;
mod extract;
mod metadata;

pub use enhancer::{ContentError, Enhancer, DEFAULT_USER_AGENT};
pub use extract::{extract_main_content, MIN_CONTENT_LEN};
pub use metadata::extract_metadata;
