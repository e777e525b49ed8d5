use super::{
    sanitize_paste, ChangeKind, ChangeOrigin, EditorAdapter, MarkerAttrs, PlacedMarker,
    Selection, TextChange,
};
use crate::error::OverlayError;
use std::collections::BTreeMap;

/// A run of text sharing the same formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    pub marker: Option<MarkerAttrs>,
}

impl Segment {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: BTreeMap::new(),
            marker: None,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn same_format(&self, other: &Segment) -> bool {
        self.attributes == other.attributes && self.marker == other.marker
    }
}

/// In-memory rich-text document.
///
/// Every mutation is recorded as a [`TextChange`] until drained with
/// [`MemoryEditor::take_changes`].
#[derive(Debug, Clone, Default)]
pub struct MemoryEditor {
    segments: Vec<Segment>,
    selection: Option<Selection>,
    changes: Vec<TextChange>,
    forced_origin: Option<ChangeOrigin>,
    host_checker: bool,
    native_spellcheck: bool,
    loading_indicator: bool,
}

impl MemoryEditor {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::plain(text)]
        };
        Self {
            segments,
            native_spellcheck: true,
            ..Default::default()
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Drain the change notifications recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<TextChange> {
        std::mem::take(&mut self.changes)
    }

    /// Report every subsequent change with `origin`, whatever the caller asked for.
    ///
    /// Mimics hosts that cannot tag programmatic writes.
    pub fn tag_all_origins_as(&mut self, origin: Option<ChangeOrigin>) {
        self.forced_origin = origin;
    }

    pub fn set_host_checker(&mut self, present: bool) {
        self.host_checker = present;
    }

    pub fn native_spellcheck(&self) -> bool {
        self.native_spellcheck
    }

    pub fn loading_indicator(&self) -> bool {
        self.loading_indicator
    }

    /// Set an arbitrary formatting attribute on a range.
    pub fn format_range(
        &mut self,
        offset: usize,
        length: usize,
        name: &str,
        value: &str,
        origin: ChangeOrigin,
    ) -> Result<(), OverlayError> {
        self.check_range(offset, length)?;
        let (first, last) = self.isolate(offset, length);
        for segment in &mut self.segments[first..last] {
            segment
                .attributes
                .insert(name.to_string(), value.to_string());
        }
        self.normalize();
        self.record(offset, 0, String::new(), ChangeKind::Format, origin);
        Ok(())
    }

    /// Attributes in effect at `position`.
    pub fn attributes_at(&self, position: usize) -> Option<&BTreeMap<String, String>> {
        let mut start = 0;
        for segment in &self.segments {
            let end = start + segment.char_len();
            if position < end {
                return Some(&segment.attributes);
            }
            start = end;
        }
        None
    }

    /// Insert text at the caret as the user would by typing.
    ///
    /// `<` and `>` keystrokes are swallowed; `None` when nothing was left to write.
    pub fn type_text(&mut self, text: &str) -> Result<Option<TextChange>, OverlayError> {
        let text: String = text.chars().filter(|c| !matches!(c, '<' | '>')).collect();
        let selection = self.caret_or_end();
        if text.is_empty() && selection.length == 0 {
            return Ok(None);
        }
        let change = self.replace_range(
            selection.index,
            selection.length,
            &text,
            ChangeOrigin::User,
        )?;
        self.selection = Some(Selection::caret(selection.index + text.chars().count()));
        Ok(Some(change))
    }

    /// Backspace at the caret.
    pub fn delete_backward(&mut self) -> Result<Option<TextChange>, OverlayError> {
        let selection = self.caret_or_end();
        let (offset, length) = if selection.length > 0 {
            (selection.index, selection.length)
        } else if selection.index > 0 {
            (selection.index - 1, 1)
        } else {
            return Ok(None);
        };
        let change = self.replace_range(offset, length, "", ChangeOrigin::User)?;
        self.selection = Some(Selection::caret(offset));
        Ok(Some(change))
    }

    /// Paste clipboard text over the selection, keeping only plain characters.
    pub fn paste(&mut self, clipboard: &str) -> Result<Option<TextChange>, OverlayError> {
        let text = sanitize_paste(clipboard);
        self.type_text(&text)
    }

    fn caret_or_end(&self) -> Selection {
        self.selection
            .unwrap_or_else(|| Selection::caret(self.len_chars()))
    }

    fn check_range(&self, offset: usize, length: usize) -> Result<(), OverlayError> {
        let len = self.len_chars();
        if offset + length > len {
            return Err(OverlayError::OutOfBounds {
                offset,
                length,
                len,
            });
        }
        Ok(())
    }

    /// Ensure a segment boundary at char `position`; returns the index of the
    /// first segment starting at or after it.
    fn split_at(&mut self, position: usize) -> usize {
        let mut start = 0;
        for index in 0..self.segments.len() {
            let len = self.segments[index].char_len();
            if position == start {
                return index;
            }
            if position < start + len {
                let byte = self.segments[index]
                    .text
                    .char_indices()
                    .nth(position - start)
                    .map(|(b, _)| b)
                    .unwrap_or(self.segments[index].text.len());
                let tail_text = self.segments[index].text.split_off(byte);
                let tail = Segment {
                    text: tail_text,
                    ..self.segments[index].clone()
                };
                self.segments.insert(index + 1, tail);
                return index + 1;
            }
            start += len;
        }
        self.segments.len()
    }

    /// Split so that `[offset, offset + length)` is covered by whole segments.
    fn isolate(&mut self, offset: usize, length: usize) -> (usize, usize) {
        let last = self.split_at(offset + length);
        let before = self.segments.len();
        let first = self.split_at(offset);
        // Splitting at `offset` shifts everything from `last` on by one.
        (first, last + (self.segments.len() - before))
    }

    fn normalize(&mut self) {
        self.segments.retain(|s| !s.text.is_empty());
        let mut merged: Vec<Segment> = Vec::with_capacity(self.segments.len());
        for segment in self.segments.drain(..) {
            match merged.last_mut() {
                Some(prev) if prev.same_format(&segment) => prev.text.push_str(&segment.text),
                _ => merged.push(segment),
            }
        }
        self.segments = merged;
    }

    fn record(
        &mut self,
        offset: usize,
        deleted: usize,
        inserted: String,
        kind: ChangeKind,
        origin: ChangeOrigin,
    ) -> TextChange {
        let change = TextChange {
            offset,
            deleted,
            inserted,
            kind,
            origin: self.forced_origin.unwrap_or(origin),
        };
        if origin != ChangeOrigin::Silent {
            self.changes.push(change.clone());
        }
        change
    }
}

impl EditorAdapter for MemoryEditor {
    fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn len_chars(&self) -> usize {
        self.segments.iter().map(Segment::char_len).sum()
    }

    fn replace_range(
        &mut self,
        offset: usize,
        length: usize,
        replacement: &str,
        origin: ChangeOrigin,
    ) -> Result<TextChange, OverlayError> {
        self.check_range(offset, length)?;

        // Inserted text inherits the formatting at the edit point, minus markers.
        let inherited = if length > 0 {
            self.attributes_at(offset).cloned()
        } else if offset > 0 {
            self.attributes_at(offset - 1).cloned()
        } else {
            self.attributes_at(0).cloned()
        }
        .unwrap_or_default();

        let (first, last) = self.isolate(offset, length);
        self.segments.drain(first..last);
        if !replacement.is_empty() {
            self.segments.insert(
                first,
                Segment {
                    text: replacement.to_string(),
                    attributes: inherited,
                    marker: None,
                },
            );
        }
        self.normalize();

        Ok(self.record(
            offset,
            length,
            replacement.to_string(),
            ChangeKind::Text,
            origin,
        ))
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    fn apply_marker(
        &mut self,
        offset: usize,
        length: usize,
        marker: &MarkerAttrs,
    ) -> Result<(), OverlayError> {
        self.check_range(offset, length)?;
        let (first, last) = self.isolate(offset, length);
        for segment in &mut self.segments[first..last] {
            segment.marker = Some(marker.clone());
        }
        self.normalize();
        self.record(offset, 0, String::new(), ChangeKind::Format, ChangeOrigin::Api);
        Ok(())
    }

    fn clear_markers(&mut self) -> usize {
        let removed = self.markers().len();
        if removed == 0 {
            return 0;
        }
        for segment in &mut self.segments {
            segment.marker = None;
        }
        self.normalize();
        self.record(0, 0, String::new(), ChangeKind::Format, ChangeOrigin::Api);
        removed
    }

    fn markers(&self) -> Vec<PlacedMarker> {
        let mut placed: Vec<PlacedMarker> = Vec::new();
        let mut start = 0;
        for segment in &self.segments {
            let end = start + segment.char_len();
            if let Some(attrs) = &segment.marker {
                match placed.last_mut() {
                    Some(prev) if prev.end == start && &prev.attrs == attrs => prev.end = end,
                    _ => placed.push(PlacedMarker {
                        start,
                        end,
                        attrs: attrs.clone(),
                    }),
                }
            }
            start = end;
        }
        placed
    }

    fn set_native_spellcheck(&mut self, enabled: bool) {
        self.native_spellcheck = enabled;
    }

    fn host_has_checker(&self) -> bool {
        self.host_checker
    }

    fn set_loading_indicator(&mut self, visible: bool) {
        self.loading_indicator = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(offset: usize, length: usize, rule: &str) -> MarkerAttrs {
        MarkerAttrs {
            offset,
            length,
            rule_id: rule.to_string(),
        }
    }

    #[test]
    fn test_replace_range_multibyte() {
        let mut editor = MemoryEditor::new("Grüße aus Köln");
        editor
            .replace_range(0, 5, "Hallo", ChangeOrigin::User)
            .unwrap();
        assert_eq!(editor.text(), "Hallo aus Köln");
        assert_eq!(editor.len_chars(), 14);
        assert_eq!(editor.slice(10, 4), "Köln");
    }

    #[test]
    fn test_replace_out_of_bounds() {
        let mut editor = MemoryEditor::new("abc");
        let err = editor
            .replace_range(2, 5, "x", ChangeOrigin::User)
            .unwrap_err();
        assert_eq!(
            err,
            OverlayError::OutOfBounds {
                offset: 2,
                length: 5,
                len: 3
            }
        );
    }

    #[test]
    fn test_markers_preserve_text_and_formatting() {
        let mut editor = MemoryEditor::new("one two three");
        editor
            .format_range(4, 3, "bold", "true", ChangeOrigin::User)
            .unwrap();
        let before = editor.segments().to_vec();

        editor.apply_marker(0, 3, &marker(0, 3, "A")).unwrap();
        editor.apply_marker(5, 5, &marker(5, 5, "B")).unwrap();
        assert_eq!(editor.text(), "one two three");
        assert_eq!(editor.markers().len(), 2);
        assert_eq!(
            editor.attributes_at(5).and_then(|a| a.get("bold")).map(String::as_str),
            Some("true")
        );

        assert_eq!(editor.clear_markers(), 2);
        assert_eq!(editor.segments(), before.as_slice());
    }

    #[test]
    fn test_marker_lookup_spans() {
        let mut editor = MemoryEditor::new("Ths is a test.");
        editor.apply_marker(0, 3, &marker(0, 3, "TYPO")).unwrap();
        let markers = editor.markers();
        assert_eq!(markers.len(), 1);
        assert_eq!((markers[0].start, markers[0].end), (0, 3));
    }

    #[test]
    fn test_changes_are_recorded_with_origin() {
        let mut editor = MemoryEditor::new("abc");
        editor.type_text("d").unwrap();
        editor.apply_marker(0, 1, &marker(0, 1, "A")).unwrap();
        editor
            .replace_range(0, 1, "z", ChangeOrigin::Silent)
            .unwrap();

        let changes = editor.take_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].origin, ChangeOrigin::User);
        assert_eq!(changes[0].inserted, "d");
        assert_eq!(changes[1].kind, ChangeKind::Format);
        assert_eq!(changes[1].origin, ChangeOrigin::Api);
        assert!(editor.take_changes().is_empty());
    }

    #[test]
    fn test_forced_origin() {
        let mut editor = MemoryEditor::new("abc");
        editor.tag_all_origins_as(Some(ChangeOrigin::User));
        editor.apply_marker(0, 2, &marker(0, 2, "A")).unwrap();
        assert_eq!(editor.take_changes()[0].origin, ChangeOrigin::User);
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut editor = MemoryEditor::new("");
        editor.type_text("helo").unwrap();
        editor.set_selection(Selection::caret(3));
        editor.type_text("l").unwrap();
        assert_eq!(editor.text(), "hello");
        assert_eq!(editor.selection(), Some(Selection::caret(4)));

        editor.delete_backward().unwrap();
        assert_eq!(editor.text(), "helo");
        editor.set_selection(Selection::caret(0));
        assert!(editor.delete_backward().unwrap().is_none());
    }

    #[test]
    fn test_angle_brackets_are_not_typed() {
        let mut editor = MemoryEditor::new("a");
        assert!(editor.type_text("<").unwrap().is_none());
        assert!(editor.take_changes().is_empty());

        let change = editor.type_text("b>c").unwrap().unwrap();
        assert_eq!(change.inserted, "bc");
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.selection(), Some(Selection::caret(3)));
    }

    #[test]
    fn test_paste_is_sanitized() {
        let mut editor = MemoryEditor::new("x");
        editor.paste("<i>hi</i>").unwrap();
        assert_eq!(editor.text(), "xihi/i");
    }

    #[test]
    fn test_replacement_drops_marker_but_keeps_formatting() {
        let mut editor = MemoryEditor::new("a Ths b");
        editor
            .format_range(2, 3, "italic", "true", ChangeOrigin::User)
            .unwrap();
        editor.apply_marker(2, 3, &marker(2, 3, "T")).unwrap();
        editor
            .replace_range(2, 3, "This", ChangeOrigin::Api)
            .unwrap();

        assert_eq!(editor.text(), "a This b");
        assert!(editor.markers().is_empty());
        assert_eq!(
            editor.attributes_at(3).and_then(|a| a.get("italic")).map(String::as_str),
            Some("true")
        );
    }
}
