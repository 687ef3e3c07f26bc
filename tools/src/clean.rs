//! Text cleaning for free-text fields (message bodies, descriptions)
//!
//! [`clean`] turns markup into plain, single-line text:
//!
//! 1. drop comments and `<script>`/`<style>` blocks
//! 2. drop tags (block-level tags become a space so words don't run together)
//! 3. decode character references, except `&lt;`, `&gt;` and `&amp;` (and
//!    their numeric forms), which would otherwise reintroduce markup
//! 4. turn line breaks into spaces and collapse whitespace runs
//!
//! Steps 1-3 repeat until nothing changes, which makes the result a fixed
//! point: `clean(clean(x)) == clean(x)`. The repetition is capped at
//! [`MAX_PASSES`].
//!
//! Cleaning is best-effort. [`try_clean`] reports markup it refuses to guess
//! about (an unterminated comment or `<script>` element, or nesting past the
//! pass limit); [`clean`] returns the input untouched in that case and never
//! fails.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use thiserror::Error;

/// Markup that [`try_clean`] will not interpret
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanError {
    /// `<!--` without a closing `-->`
    #[error("unterminated comment")]
    UnterminatedComment,

    /// `<script>` or `<style>` without its closing tag
    #[error("unterminated <{0}> element")]
    UnterminatedElement(String),

    /// Markup nested so deeply that it is still changing after the pass limit
    #[error("markup nested deeper than {0} levels")]
    TooDeeplyNested(usize),
}

/// Upper bound on strip-and-decode passes; each pass peels one nesting level
pub const MAX_PASSES: usize = 64;

#[allow(clippy::expect_used)]
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

#[allow(clippy::expect_used)]
static RAW_TEXT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid raw text regex")
});

#[allow(clippy::expect_used)]
static RAW_TEXT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(script|style)\b").expect("valid raw open regex"));

#[allow(clippy::expect_used)]
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:address|article|aside|blockquote|br|dd|div|dl|dt|footer|h[1-6]|header|hr|li|ol|p|pre|section|table|td|th|tr|ul)\b[^<>]*>",
    )
    .expect("valid block tag regex")
});

#[allow(clippy::expect_used)]
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z][^<>]*>|<[!?][^<>]*>").expect("valid tag regex")
});

#[allow(clippy::expect_used)]
static CHAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([A-Za-z][A-Za-z0-9]{1,7}));")
        .expect("valid character reference regex")
});

/// Clean `text`, falling back to the original on markup it cannot handle
#[must_use]
pub fn clean(text: &str) -> String {
    try_clean(text).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "leaving text uncleaned");
        text.to_string()
    })
}

/// Clean `text`, reporting markup it cannot handle
///
/// # Errors
///
/// Returns `CleanError` for an unterminated comment or `<script>`/`<style>`
/// element, and for markup still changing after [`MAX_PASSES`] passes.
pub fn try_clean(text: &str) -> Result<String, CleanError> {
    // Every pass that changes the text makes it strictly shorter, so an
    // unchanged pass means both stripping and decoding reached a fixed point.
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        let stripped = strip_once(&current)?;
        let decoded = decode_char_refs(&stripped);
        if decoded == current {
            return Ok(collapse_whitespace(&current));
        }
        current = decoded.into_owned();
    }
    Err(CleanError::TooDeeplyNested(MAX_PASSES))
}

fn strip_once(text: &str) -> Result<String, CleanError> {
    let text = COMMENT.replace_all(text, "");
    if text.contains("<!--") {
        return Err(CleanError::UnterminatedComment);
    }

    let text = RAW_TEXT_ELEMENT.replace_all(&text, " ");
    if let Some(open) = RAW_TEXT_OPEN.captures(&text) {
        return Err(CleanError::UnterminatedElement(open[1].to_ascii_lowercase()));
    }

    let text = BLOCK_TAG.replace_all(&text, " ");
    Ok(TAG.replace_all(&text, "").into_owned())
}

fn decode_char_refs(text: &str) -> Cow<'_, str> {
    CHAR_REF.replace_all(text, |caps: &Captures<'_>| {
        let decoded = if let Some(dec) = caps.get(1) {
            dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else if let Some(hex) = caps.get(2) {
            u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
        } else {
            caps.get(3).and_then(|name| named_char_ref(name.as_str()))
        };

        match decoded {
            Some(c) if !matches!(c, '<' | '>' | '&' | '\0') => c.to_string(),
            _ => caps[0].to_string(),
        }
    })
}

fn named_char_ref(name: &str) -> Option<char> {
    let c = match name {
        "nbsp" => '\u{a0}',
        "quot" => '"',
        "apos" => '\'',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "middot" => '\u{b7}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "euro" => '\u{20ac}',
        "pound" => '\u{a3}',
        "deg" => '\u{b0}',
        _ => return None,
    };
    Some(c)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
