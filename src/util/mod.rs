//! Utility functions shared by the transform, enhancer and serializers.
//!
//! - **Dates**: lenient feed date parsing with a total ordering key
//! - **Text**: case-insensitive matching, title collation, HTML stripping,
//!   reading-time estimates and XML character sanitizing
//!
//! # Examples
//!
//! ```
//! use feedshift::util::{reading_minutes, timestamp};
//!
//! assert_eq!(timestamp("not a date"), 0);
//! assert_eq!(reading_minutes("<p>five words of article text</p>"), 1);
//! ```

mod date;
mod text;

pub use date::{parse_date, timestamp, to_rfc3339};
pub use text::{
    contains_ignore_case, locale_cmp, reading_minutes, strip_html, word_count, xml_safe,
    WORDS_PER_MINUTE,
};
