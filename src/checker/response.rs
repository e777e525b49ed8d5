//! Wire format of a LanguageTool-compatible checking service.

use crate::{Category, Match, Rule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub matches: Option<Vec<WireMatch>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Language {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "detectedLanguage", default)]
    pub detected_language: Option<DetectedLanguage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectedLanguage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMatch {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "shortMessage", default)]
    pub short_message: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub replacements: Option<Vec<WireReplacement>>,
    #[serde(default)]
    pub rule: Option<WireRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReplacement {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<WireCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireCategory {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Unit of the offsets reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetEncoding {
    /// UTF-16 code units (LanguageTool, browsers).
    #[default]
    Utf16,
    /// Unicode scalar values.
    Chars,
}

/// Maps service offsets onto char indices of the text that was checked.
struct OffsetMap {
    /// UTF-16 position of every char boundary, including the end of the text.
    boundaries: Vec<usize>,
}

impl OffsetMap {
    fn new(text: &str) -> Self {
        let mut boundaries = Vec::with_capacity(text.len() + 1);
        let mut position = 0;
        for c in text.chars() {
            boundaries.push(position);
            position += c.len_utf16();
        }
        boundaries.push(position);
        Self { boundaries }
    }

    /// `None` when the offset splits a surrogate pair or lies past the end.
    fn to_char(&self, utf16: usize) -> Option<usize> {
        self.boundaries.binary_search(&utf16).ok()
    }

    fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }
}

/// Convert a decoded response into store-ready matches, sorted by offset.
pub fn normalize(
    text: &str,
    response: CheckResponse,
    encoding: OffsetEncoding,
    require_replacements: bool,
) -> Vec<Match> {
    let map = OffsetMap::new(text);
    let mut matches: Vec<Match> = response
        .matches
        .unwrap_or_default()
        .into_iter()
        .filter_map(|wire| {
            let range = wire
                .offset
                .checked_add(wire.length)
                .and_then(|wire_end| match encoding {
                    OffsetEncoding::Utf16 => {
                        Some((map.to_char(wire.offset)?, map.to_char(wire_end)?))
                    }
                    OffsetEncoding::Chars => Some((wire.offset, wire_end)),
                })
                .filter(|&(offset, end)| offset < end && end <= map.char_len());
            let Some((offset, end)) = range else {
                tracing::warn!(
                    offset = wire.offset,
                    length = wire.length,
                    "dropping match outside the checked text"
                );
                return None;
            };

            let replacements: Vec<String> = wire
                .replacements
                .unwrap_or_default()
                .into_iter()
                .map(|r| r.value)
                .collect();
            if require_replacements && replacements.is_empty() {
                return None;
            }

            let rule = wire
                .rule
                .map(|r| Rule {
                    id: r.id,
                    description: r.description,
                    category: r.category.map(|c| Category {
                        id: c.id,
                        name: c.name,
                    }),
                })
                .unwrap_or_default();

            Some(Match {
                offset,
                length: end - offset,
                message: wire.message,
                short_message: wire.short_message,
                replacements,
                rule,
            })
        })
        .collect();

    matches.sort_by_key(|m| m.offset);
    matches
}
