//! Feed parsing for RSS 2.0 and Atom 1.0.
//!
//! - [`tree`] - Minimal element tree over `quick-xml` events that hides
//!   singleton-vs-sequence and text-vs-node differences
//! - [`parser`] - Dialect detection and mapping into [`crate::model`]
//!
//! # Example
//!
//! ```
//! use feedshift::feed::parse;
//!
//! let feed = parse("<rss><channel><title>T</title><item><title>Hi</title></item></channel></rss>")?;
//! assert_eq!(feed.items.len(), 1);
//! # Ok::<(), feedshift::feed::ParseError>(())
//! ```

mod parser;
pub mod tree;

pub use parser::{parse, ParseError};
