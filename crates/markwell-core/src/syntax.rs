//! Leading block-markup triggers.
//!
//! A trigger is the prefix that turns a plain line into a block construct
//! once followed by a space: `#` to `######`, `*` or `-`, `1.` and `>`.

use crate::dom::HeadingLevel;

/// A block construct recognised at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Heading(HeadingLevel),
    UnorderedItem,
    OrderedItem,
    Blockquote,
}

/// Match `text` against the leading triggers.
///
/// Leading whitespace is not skipped; the marker must be the first thing on
/// the line and must be followed by a space.
pub fn detect_trigger(text: &str) -> Option<Trigger> {
    let bytes = text.as_bytes();
    match bytes.first()? {
        b'#' => {
            let hashes = bytes.iter().take_while(|&&b| b == b'#').count();
            let level = HeadingLevel::from_depth(hashes)?;
            (bytes.get(hashes) == Some(&b' ')).then_some(Trigger::Heading(level))
        }
        b'*' | b'-' => (bytes.get(1) == Some(&b' ')).then_some(Trigger::UnorderedItem),
        b'>' => (bytes.get(1) == Some(&b' ')).then_some(Trigger::Blockquote),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            (bytes.get(digits) == Some(&b'.') && bytes.get(digits + 1) == Some(&b' '))
                .then_some(Trigger::OrderedItem)
        }
        _ => None,
    }
}

/// Whether any trigger matches.
pub fn has_trigger(text: &str) -> bool {
    detect_trigger(text).is_some()
}

/// Remove one leading blockquote marker (`>` plus optional space).
pub fn strip_quote_marker(text: &str) -> &str {
    match text.strip_prefix('>') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => text,
    }
}
