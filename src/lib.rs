//! Feed pipeline: parse RSS 2.0 / Atom 1.0 into one model, filter, sort and
//! merge it, optionally pull in full article text, and write it back out as
//! RSS, Atom or JSON Feed 1.1.
//!
//! ```
//! use feedshift::feed::parse;
//! use feedshift::serialize::{serialize, OutputFormat};
//! use feedshift::transform::{filter, FilterOptions};
//!
//! let raw = r#"<rss version="2.0"><channel><title>T</title>
//!     <item><title>Rust 1.80</title></item>
//!     <item><title>Gardening</title></item>
//! </channel></rss>"#;
//!
//! let feed = parse(raw).unwrap();
//! let rusty = filter(&feed, &FilterOptions {
//!     keywords: vec!["rust".into()],
//!     ..Default::default()
//! });
//! let json = serialize(&rusty, OutputFormat::Json).unwrap();
//! assert!(json.contains("Rust 1.80"));
//! assert!(!json.contains("Gardening"));
//! ```

pub mod config;
pub mod content;
pub mod feed;
pub mod model;
pub mod pipeline;
pub mod serialize;
pub mod transform;
pub mod util;
