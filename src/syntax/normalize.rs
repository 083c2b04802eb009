//! Surface-syntax normalization.
//!
//! The client engine renders expressions with a few notations that are not
//! part of the structural grammar: list brackets wrapped around every
//! parenthesized operand and typed literals such as `dyn int: 4`. A
//! [`SurfaceNormalizer`] rewrites those away before parsing, so another
//! upstream engine's quirks can be handled without touching the parser.

use regex::Regex;
use std::sync::LazyLock;

/// `[dyn TYPE: VALUE]`, `(lit TYPE: VALUE)` and mixed-bracket variants
static TYPED_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\[\(](dyn|lit)\s+\w+:\s*([^\]\)]+)[\]\)]").expect("typed literal pattern")
});

/// Rewrites engine-specific notation into the structural grammar
pub trait SurfaceNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Normalizer for the debug rendering of the polars-style client engine
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugFormatNormalizer;

impl SurfaceNormalizer for DebugFormatNormalizer {
    fn normalize(&self, text: &str) -> String {
        let text = strip_outer_brackets(text);
        let text = collapse_bracket_groups(text);
        rewrite_typed_literals(&text)
    }
}

/// Normalizer that only trims whitespace
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl SurfaceNormalizer for Verbatim {
    fn normalize(&self, text: &str) -> String {
        text.trim().to_string()
    }
}

/// Trim, then drop one enclosing `[...]` pair (a single-element list rendering)
pub fn strip_outer_brackets(text: &str) -> &str {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('[') && text.ends_with(']') {
        text[1..text.len() - 1].trim()
    } else {
        text
    }
}

/// Collapse `([ inner ])` into `( inner )`.
///
/// Repeatedly takes the rightmost `])` and pairs it with the nearest `([`
/// before it, until no such pair remains.
pub fn collapse_bracket_groups(text: &str) -> String {
    let mut text = text.to_string();
    while let Some(close) = text.rfind("])") {
        let Some(open) = text[..close].rfind("([") else {
            break;
        };
        text = format!(
            "{}({}){}",
            &text[..open],
            &text[open + 2..close],
            &text[close + 2..]
        );
    }
    text
}

/// Replace every typed literal with its value, trimmed
pub fn rewrite_typed_literals(text: &str) -> String {
    TYPED_LITERAL
        .replace_all(text, |caps: &regex::Captures<'_>| caps[2].trim().to_string())
        .into_owned()
}
