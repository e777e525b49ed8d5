use crate::error::OverlayError;
use crate::{Match, MatchKey};

/// The matches that are valid against the current document, sorted by offset.
#[derive(Debug, Clone, Default)]
pub struct MatchStore {
    matches: Vec<Match>,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with the result of a completed check.
    pub fn replace_all(&mut self, mut matches: Vec<Match>) {
        matches.sort_by_key(|m| m.offset);
        self.matches = matches;
    }

    /// Shift every match strictly after `position` by `delta`; drop the match at `position`.
    pub fn shift_after(&mut self, position: usize, delta: isize) {
        self.matches.retain(|m| m.offset != position);
        for m in self.matches.iter_mut().filter(|m| m.offset > position) {
            m.offset = m.offset.saturating_add_signed(delta);
        }
    }

    /// Remove exactly the addressed match.
    pub fn remove_at(&mut self, key: &MatchKey) -> Result<Match, OverlayError> {
        let index = self
            .matches
            .iter()
            .position(|m| m.matches_key(key))
            .ok_or_else(|| OverlayError::MarkerLookup {
                offset: key.offset,
                length: key.length,
                rule_id: key.rule_id.clone(),
            })?;
        Ok(self.matches.remove(index))
    }

    /// Reconcile the store with a replacement of `old_len` chars at `position`
    /// by `new_len` chars. Returns whether any match was dropped or moved.
    ///
    /// Matches intersecting the replaced range no longer describe the text and
    /// are dropped. Later matches move by the length difference.
    pub fn apply_edit(&mut self, position: usize, old_len: usize, new_len: usize) -> bool {
        let edit_end = position.saturating_add(old_len);
        let before = self.matches.len();
        self.matches.retain(|m| {
            let touches = if old_len == 0 {
                m.offset < position && position < m.end()
            } else {
                m.offset < edit_end && position < m.end()
            };
            !touches && m.offset != position
        });
        let dropped = self.matches.len() != before;

        let delta = new_len as isize - old_len as isize;
        let mut moved = false;
        if delta != 0 {
            for m in self.matches.iter_mut().filter(|m| m.offset > position) {
                m.offset = m.offset.saturating_add_signed(delta);
                moved = true;
            }
        }
        dropped || moved
    }

    pub fn find(&self, key: &MatchKey) -> Option<&Match> {
        self.matches.iter().find(|m| m.matches_key(key))
    }

    /// The match covering `position`, if any.
    pub fn at_position(&self, position: usize) -> Option<&Match> {
        self.matches
            .iter()
            .find(|m| m.offset <= position && position < m.end())
    }

    pub fn all(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn clear(&mut self) {
        self.matches.clear();
    }
}
