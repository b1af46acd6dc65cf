use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::OnceLock;

use icu_collator::{Collator, CollatorBorrowed};
use scraper::{ElementRef, Html};

/// Average reading speed used for reading-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Case-insensitive substring test.
///
/// Both sides are lowercased with Unicode rules, so `"RUST"` matches
/// `"Learning rust"` and `"ÉTÉ"` matches `"été"`.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Root-locale collator, built once from the compiled-in CLDR data.
fn collator() -> Option<&'static CollatorBorrowed<'static>> {
    static COLLATOR: OnceLock<Option<CollatorBorrowed<'static>>> = OnceLock::new();
    COLLATOR
        .get_or_init(|| match Collator::try_new(Default::default(), Default::default()) {
            Ok(collator) => Some(collator),
            Err(e) => {
                tracing::warn!(error = %e, "Collation data unavailable, sorting titles by case-folded text");
                None
            }
        })
        .as_ref()
}

/// Compares two strings the way a human-facing title list expects.
///
/// Uses the Unicode Collation Algorithm with root-locale rules: letters
/// compare by base letter first, so `"eagle" < "Éclair" < "Zebra"`. Accents
/// and then case only break ties, with lowercase first
/// (`"apple" < "Apple" < "banana"`). Strings the collator considers equal
/// fall back to code point order so the result is a total order.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let collated = match collator() {
        Some(collator) => collator.compare(a, b),
        None => case_folded_cmp(a, b),
    };
    collated.then_with(|| a.cmp(b))
}

fn case_folded_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Elements that start a new line of text when rendered.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Removes markup from an HTML fragment, keeping its text.
///
/// Block elements are separated by a space so `<p>one</p><p>two</p>` yields
/// two words, while inline markup joins directly: `un<b>believ</b>able` stays
/// one word.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    collect_text(fragment.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let block = BLOCK_ELEMENTS.contains(&child_element.value().name());
            if block {
                out.push(' ');
            }
            collect_text(child_element, out);
            if block {
                out.push(' ');
            }
        }
    }
}

/// Counts words separated by runs of whitespace.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated minutes to read an HTML body, rounded up.
pub fn reading_minutes(html: &str) -> usize {
    word_count(&strip_html(html)).div_ceil(WORDS_PER_MINUTE)
}

/// Drops characters that XML 1.0 does not allow in documents.
///
/// Everything except tab, newline and carriage return below U+0020 is
/// rejected by conforming parsers, including our own. Feeds scraped from the
/// wild routinely carry stray form feeds and vertical tabs.
///
/// Returns `Cow::Borrowed` when nothing needs removing (the common case).
pub fn xml_safe(s: &str) -> Cow<'_, str> {
    let is_invalid = |c: char| {
        matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
    };

    if !s.chars().any(is_invalid) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(s.chars().filter(|&c| !is_invalid(c)).collect())
}
