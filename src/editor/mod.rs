//! The contract between the checker core and a host editor.
//!
//! All positions are char indices into the plain-text projection of the document.

pub mod memory;

pub use memory::{MemoryEditor, Segment};

use crate::error::OverlayError;
use crate::Match;
use serde::{Deserialize, Serialize};

/// Who caused a document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOrigin {
    User,
    Api,
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Characters were inserted or removed.
    Text,
    /// Only formatting (markers included) changed.
    Format,
}

/// One entry of the editor's change-notification stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub offset: usize,
    pub deleted: usize,
    pub inserted: String,
    pub kind: ChangeKind,
    pub origin: ChangeOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }
}

/// Metadata carried by an overlay marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerAttrs {
    pub offset: usize,
    pub length: usize,
    pub rule_id: String,
}

impl MarkerAttrs {
    pub fn for_match(m: &Match) -> Self {
        Self {
            offset: m.offset,
            length: m.length,
            rule_id: m.rule.id.clone(),
        }
    }

    pub fn key(&self) -> crate::MatchKey {
        crate::MatchKey {
            offset: self.offset,
            length: self.length,
            rule_id: self.rule_id.clone(),
        }
    }
}

/// A marker as found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedMarker {
    pub start: usize,
    pub end: usize,
    pub attrs: MarkerAttrs,
}

/// Capabilities the checker needs from a host editor.
pub trait EditorAdapter {
    /// Plain-text projection of the document.
    fn text(&self) -> String;

    fn len_chars(&self) -> usize {
        self.text().chars().count()
    }

    fn slice(&self, offset: usize, length: usize) -> String {
        self.text().chars().skip(offset).take(length).collect()
    }

    /// Replace `[offset, offset + length)` with `replacement`.
    fn replace_range(
        &mut self,
        offset: usize,
        length: usize,
        replacement: &str,
        origin: ChangeOrigin,
    ) -> Result<TextChange, OverlayError>;

    fn selection(&self) -> Option<Selection>;

    fn set_selection(&mut self, selection: Selection);

    /// Annotate a range with a marker without touching its text or other formatting.
    fn apply_marker(
        &mut self,
        offset: usize,
        length: usize,
        marker: &MarkerAttrs,
    ) -> Result<(), OverlayError>;

    /// Strip every marker annotation. Returns how many marker runs were removed.
    fn clear_markers(&mut self) -> usize;

    fn markers(&self) -> Vec<PlacedMarker>;

    fn set_native_spellcheck(&mut self, _enabled: bool) {}

    /// Whether another checker already decorates this editor.
    fn host_has_checker(&self) -> bool {
        false
    }

    fn set_loading_indicator(&mut self, _visible: bool) {}
}

impl<T: EditorAdapter + ?Sized> EditorAdapter for &mut T {
    fn text(&self) -> String {
        (**self).text()
    }

    fn len_chars(&self) -> usize {
        (**self).len_chars()
    }

    fn slice(&self, offset: usize, length: usize) -> String {
        (**self).slice(offset, length)
    }

    fn replace_range(
        &mut self,
        offset: usize,
        length: usize,
        replacement: &str,
        origin: ChangeOrigin,
    ) -> Result<TextChange, OverlayError> {
        (**self).replace_range(offset, length, replacement, origin)
    }

    fn selection(&self) -> Option<Selection> {
        (**self).selection()
    }

    fn set_selection(&mut self, selection: Selection) {
        (**self).set_selection(selection)
    }

    fn apply_marker(
        &mut self,
        offset: usize,
        length: usize,
        marker: &MarkerAttrs,
    ) -> Result<(), OverlayError> {
        (**self).apply_marker(offset, length, marker)
    }

    fn clear_markers(&mut self) -> usize {
        (**self).clear_markers()
    }

    fn markers(&self) -> Vec<PlacedMarker> {
        (**self).markers()
    }

    fn set_native_spellcheck(&mut self, enabled: bool) {
        (**self).set_native_spellcheck(enabled)
    }

    fn host_has_checker(&self) -> bool {
        (**self).host_has_checker()
    }

    fn set_loading_indicator(&mut self, visible: bool) {
        (**self).set_loading_indicator(visible)
    }
}

/// Whether a text is worth sending to the checking service.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Plain-clipboard policy: drop markup brackets and symbol/emoji ranges from pasted text.
pub fn sanitize_paste(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            !matches!(c,
                '<' | '>' | '\u{00a9}' | '\u{00ae}'
                | '\u{2000}'..='\u{2013}'
                | '\u{2015}'..='\u{3300}'
                | '\u{1f000}'..='\u{1ffff}')
        })
        .collect()
}
