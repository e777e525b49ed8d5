use crate::editor::{
    ChangeOrigin, EditorAdapter, MarkerAttrs, MemoryEditor, PlacedMarker, Selection, TextChange,
};
use crate::error::OverlayError;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A file being checked from the command line.
///
/// The document lives in a [`MemoryEditor`]; the loading indicator is a spinner
/// on stderr.
pub struct TerminalEditor {
    document: MemoryEditor,
    label: String,
    spinner: Option<ProgressBar>,
}

impl TerminalEditor {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            document: MemoryEditor::new(text),
            label: label.into(),
            spinner: None,
        }
    }

    pub fn document(&self) -> &MemoryEditor {
        &self.document
    }
}

impl EditorAdapter for TerminalEditor {
    fn text(&self) -> String {
        self.document.text()
    }

    fn len_chars(&self) -> usize {
        self.document.len_chars()
    }

    fn replace_range(
        &mut self,
        offset: usize,
        length: usize,
        replacement: &str,
        origin: ChangeOrigin,
    ) -> Result<TextChange, OverlayError> {
        self.document
            .replace_range(offset, length, replacement, origin)
    }

    fn selection(&self) -> Option<Selection> {
        self.document.selection()
    }

    fn set_selection(&mut self, selection: Selection) {
        self.document.set_selection(selection)
    }

    fn apply_marker(
        &mut self,
        offset: usize,
        length: usize,
        marker: &MarkerAttrs,
    ) -> Result<(), OverlayError> {
        self.document.apply_marker(offset, length, marker)
    }

    fn clear_markers(&mut self) -> usize {
        self.document.clear_markers()
    }

    fn markers(&self) -> Vec<PlacedMarker> {
        self.document.markers()
    }

    fn set_loading_indicator(&mut self, visible: bool) {
        match (visible, self.spinner.take()) {
            (true, None) => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                    pb.set_style(style);
                }
                pb.set_message(format!("Checking {}...", self.label));
                pb.enable_steady_tick(Duration::from_millis(80));
                self.spinner = Some(pb);
            }
            (true, Some(pb)) => self.spinner = Some(pb),
            (false, Some(pb)) => pb.finish_and_clear(),
            (false, None) => {}
        }
    }
}
