use crate::editor::{EditorAdapter, MarkerAttrs};
use crate::schedule::LoopGuard;
use crate::Match;
use std::time::Instant;

/// Projects the match store onto the document as marker annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayRenderer;

impl OverlayRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Remove every marker, then insert one per match. Returns the number inserted.
    pub fn render<E: EditorAdapter + ?Sized>(
        &self,
        editor: &mut E,
        matches: &[Match],
        guard: &mut LoopGuard,
        now: Instant,
    ) -> usize {
        self.clear(editor, guard, now);

        let len = editor.len_chars();
        let mut inserted = 0;
        for m in matches {
            if m.end() > len {
                tracing::warn!(
                    offset = m.offset,
                    length = m.length,
                    len,
                    "match no longer fits the document, not marking it"
                );
                continue;
            }
            guard.begin_suppression(now);
            match editor.apply_marker(m.offset, m.length, &MarkerAttrs::for_match(m)) {
                Ok(()) => inserted += 1,
                Err(e) => tracing::warn!(error = %e, "failed to insert marker"),
            }
        }
        tracing::debug!(inserted, "added suggestion markers");
        inserted
    }

    /// Remove every marker without touching text or other formatting.
    pub fn clear<E: EditorAdapter + ?Sized>(
        &self,
        editor: &mut E,
        guard: &mut LoopGuard,
        now: Instant,
    ) -> usize {
        guard.begin_suppression(now);
        editor.clear_markers()
    }
}

/// Whether a check is running and whether to show it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingIndicator {
    enabled: bool,
    loading: bool,
}

impl LoadingIndicator {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            loading: false,
        }
    }

    pub fn start(&mut self) {
        self.loading = true;
    }

    pub fn stop(&mut self) {
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn visible(&self) -> bool {
        self.enabled && self.loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{ChangeOrigin, MemoryEditor};
    use crate::Rule;

    fn m(offset: usize, length: usize, rule: &str) -> Match {
        Match {
            offset,
            length,
            message: "msg".to_string(),
            short_message: String::new(),
            replacements: vec!["r".to_string()],
            rule: Rule {
                id: rule.to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_render_twice_is_idempotent() {
        let mut editor = MemoryEditor::new("Ths is a tset of teh overlay.");
        editor
            .format_range(0, 3, "bold", "true", ChangeOrigin::User)
            .unwrap();
        let matches = vec![m(0, 3, "A"), m(9, 4, "B"), m(17, 3, "C")];
        let mut guard = LoopGuard::default();
        let renderer = OverlayRenderer::new();
        let now = Instant::now();

        assert_eq!(renderer.render(&mut editor, &matches, &mut guard, now), 3);
        let text_once = editor.text();
        let segments_once = editor.segments().to_vec();

        assert_eq!(renderer.render(&mut editor, &matches, &mut guard, now), 3);
        assert_eq!(editor.text(), text_once);
        assert_eq!(editor.segments(), segments_once.as_slice());
        assert_eq!(editor.markers().len(), 3);
    }

    #[test]
    fn test_clear_round_trips_plain_text() {
        let original = "Dies ist eine Test der guten Tests";
        let mut editor = MemoryEditor::new(original);
        let before = editor.segments().to_vec();
        let mut guard = LoopGuard::default();
        let renderer = OverlayRenderer::new();
        let now = Instant::now();

        renderer.render(&mut editor, &[m(9, 9, "DE_AGREEMENT")], &mut guard, now);
        assert_eq!(renderer.clear(&mut editor, &mut guard, now), 1);

        assert_eq!(editor.text().as_bytes(), original.as_bytes());
        assert_eq!(editor.segments(), before.as_slice());
    }

    #[test]
    fn test_render_arms_guard_and_skips_stale_matches() {
        let mut editor = MemoryEditor::new("short");
        let mut guard = LoopGuard::default();
        let now = Instant::now();

        let inserted = OverlayRenderer::new().render(
            &mut editor,
            &[m(0, 2, "A"), m(3, 10, "B")],
            &mut guard,
            now,
        );
        assert_eq!(inserted, 1);
        assert!(guard.is_active(now));
    }

    #[test]
    fn test_loading_indicator_rapid_toggle() {
        let mut hidden = LoadingIndicator::new(false);
        hidden.start();
        assert!(hidden.is_loading());
        assert!(!hidden.visible());

        let mut shown = LoadingIndicator::new(true);
        shown.start();
        shown.start();
        assert!(shown.visible());
        shown.stop();
        shown.stop();
        assert!(!shown.visible());
        shown.start();
        shown.stop();
        assert!(!shown.is_loading());
    }
}
