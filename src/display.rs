//! Tooltip and search-text composition.
//!
//! Everything here is a pure function of a [`MetadataMap`] and a
//! [`KeyFilter`]: the same inputs always produce the same rows and the same
//! bytes of search text.
//!
//! Key order is total and ordinal (byte-wise on UTF-8, which matches code
//! point order). `positive_prompt` and `negative_prompt` are pinned ahead of
//! the generic keys.

use std::cmp::Ordering;
use std::fmt::Write as _;

use imagedrawer_metadata::{MetadataMap, NEGATIVE_PROMPT_KEY, POSITIVE_PROMPT_KEY};

use crate::filter::KeyFilter;

/// Two-character escape sequence generators leave inside prompt text.
const ESCAPED_NEWLINE: &str = "\\n";

/// One row of the metadata tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TooltipRow {
    /// Full-width block of prompt text.
    Text(String),
    /// Full-width label introducing the next row.
    Label(String),
    /// Two-column key/value row.
    Field { key: String, value: String },
}

impl TooltipRow {
    /// Whether the row spans both tooltip columns.
    pub fn is_full_width(&self) -> bool {
        !matches!(self, TooltipRow::Field { .. })
    }
}

/// Everything the drawer shows or indexes for one item's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayBundle {
    pub tooltip: Vec<TooltipRow>,
    pub search_text: String,
}

impl DisplayBundle {
    /// Whether there is anything to show in a tooltip.
    pub fn has_tooltip(&self) -> bool {
        !self.tooltip.is_empty()
    }
}

/// One entry of the per-item "copy" menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    pub key: String,
    /// Value with one surrounding pair of double quotes removed.
    pub text: String,
}

impl CopyEntry {
    pub fn label(&self) -> String {
        if self.key == POSITIVE_PROMPT_KEY {
            "Copy Positive Prompt".to_string()
        } else {
            format!("Copy {}", self.key)
        }
    }
}

/// Compose both the tooltip rows and the search text.
pub fn compose(metadata: &MetadataMap, filter: &KeyFilter) -> DisplayBundle {
    DisplayBundle {
        tooltip: tooltip_rows(metadata, filter),
        search_text: search_text(metadata, filter),
    }
}

/// Every key except `positive_prompt`, with `negative_prompt` first and the
/// rest in ascending ordinal order.
pub fn generic_key_order(metadata: &MetadataMap) -> Vec<&str> {
    let mut keys: Vec<&str> = metadata
        .keys()
        .filter(|k| *k != POSITIVE_PROMPT_KEY)
        .collect();

    keys.sort_by(|a, b| {
        match (*a == NEGATIVE_PROMPT_KEY, *b == NEGATIVE_PROMPT_KEY) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.cmp(b),
        }
    });
    keys
}

/// Flatten surfaced metadata into the text appended to an item's search terms.
///
/// The positive prompt leads, newline-terminated. Each surfaced generic key
/// then adds `"\n{key}: {value}, "` with newlines removed from the value.
/// Escaped newlines left anywhere in the result become real line breaks.
pub fn search_text(metadata: &MetadataMap, filter: &KeyFilter) -> String {
    let mut out = String::new();

    if let Some(positive) = metadata.positive_prompt() {
        out.push_str(positive);
        out.push('\n');
    }

    for key in generic_key_order(metadata) {
        if !filter.is_key_surfaced(key) {
            continue;
        }
        let value = strip_newlines(metadata.get(key).unwrap_or_default());
        let _ = write!(out, "\n{key}: {value}, ");
    }

    expand_escaped_newlines(&out)
}

/// Build the tooltip rows: positive prompt, negative prompt (label + text),
/// then the surfaced generic keys as key/value rows.
pub fn tooltip_rows(metadata: &MetadataMap, filter: &KeyFilter) -> Vec<TooltipRow> {
    let mut rows = Vec::new();

    if let Some(positive) = metadata.positive_prompt() {
        rows.push(TooltipRow::Text(prompt_text(positive)));
    }

    if let Some(negative) = metadata.negative_prompt() {
        rows.push(TooltipRow::Label(format!("{NEGATIVE_PROMPT_KEY}:")));
        rows.push(TooltipRow::Text(prompt_text(negative)));
    }

    let mut keys: Vec<&str> = metadata
        .keys()
        .filter(|k| *k != POSITIVE_PROMPT_KEY && *k != NEGATIVE_PROMPT_KEY)
        .collect();
    keys.sort_unstable();

    for key in keys {
        if !filter.is_key_surfaced(key) {
            continue;
        }
        rows.push(TooltipRow::Field {
            key: key.to_string(),
            value: strip_newlines(metadata.get(key).unwrap_or_default()),
        });
    }

    rows
}

/// Entries for the copy menu: positive prompt first, then all other keys in
/// ordinal order. The key filter does not apply here.
pub fn copy_entries(metadata: &MetadataMap) -> Vec<CopyEntry> {
    let mut entries = Vec::new();

    if let Some(positive) = metadata.positive_prompt() {
        entries.push(CopyEntry {
            key: POSITIVE_PROMPT_KEY.to_string(),
            text: strip_quotes(positive).to_string(),
        });
    }

    let mut keys: Vec<&str> = metadata
        .keys()
        .filter(|k| *k != POSITIVE_PROMPT_KEY)
        .collect();
    keys.sort_unstable();

    for key in keys {
        entries.push(CopyEntry {
            key: key.to_string(),
            text: strip_quotes(metadata.get(key).unwrap_or_default()).to_string(),
        });
    }

    entries
}

/// Remove literal newlines and escaped `\n` sequences.
pub fn strip_newlines(value: &str) -> String {
    value.replace('\n', "").replace(ESCAPED_NEWLINE, "")
}

/// Turn escaped `\n` sequences into real line breaks.
pub fn expand_escaped_newlines(value: &str) -> String {
    value.replace(ESCAPED_NEWLINE, "\n")
}

/// Insert a space after every comma that is directly followed by a
/// non-whitespace character.
pub fn space_after_commas(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + value.len() / 8);
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == ',' && chars.peek().is_some_and(|next| !next.is_whitespace()) {
            out.push(' ');
        }
    }
    out
}

fn prompt_text(value: &str) -> String {
    space_after_commas(&expand_escaped_newlines(value))
}

fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}
