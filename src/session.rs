//! A spell-check session attached to one editor.
//!
//! The session is sans-IO: every entry point takes the current [`Instant`], and the
//! only awaits are the network round trip in [`SpellCheckSession::check_now`] and the
//! debounce sleep in [`SpellCheckSession::run_due`].

use crate::checker::transport::Transport;
use crate::checker::CheckerClient;
use crate::editor::{
    is_blank, ChangeKind, ChangeOrigin, EditorAdapter, MarkerAttrs, Selection, TextChange,
};
use crate::error::{CheckError, OverlayError};
use crate::overlay::{LoadingIndicator, OverlayRenderer};
use crate::popup::{OpenPopup, Rect, SuggestionPopup, Viewport, DEFAULT_MAX_SUGGESTIONS};
use crate::schedule::{Debouncer, LoopGuard, DEFAULT_COOLDOWN, DEFAULT_LOOP_GUARD};
use crate::store::MatchStore;
use crate::Match;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub cooldown: Duration,
    pub loop_guard: Duration,
    pub show_loading_indicator: bool,
    pub disable_native_spellcheck: bool,
    pub max_suggestions: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            loop_guard: DEFAULT_LOOP_GUARD,
            show_loading_indicator: false,
            disable_native_spellcheck: true,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

/// Identifies one check request and the text it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    pub generation: u64,
    pub text: String,
    pub digest: [u8; 32],
}

/// What happened to a completed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckApplied {
    /// The store now holds this many matches.
    Applied(usize),
    /// The check failed; the store was emptied.
    Failed,
    /// The document changed while the check was running; a re-check is scheduled.
    Discarded,
    /// A newer check was issued after this one.
    Superseded,
}

fn digest(text: &str) -> [u8; 32] {
    Sha256::digest(text.as_bytes()).into()
}

pub struct SpellCheckSession<E: EditorAdapter> {
    editor: E,
    store: MatchStore,
    debouncer: Debouncer,
    guard: LoopGuard,
    renderer: OverlayRenderer,
    loading: LoadingIndicator,
    popup: SuggestionPopup,
    generation: u64,
    in_flight: Option<u64>,
    /// Text writes made by the session that the change stream has not echoed yet.
    own_writes: Vec<TextChange>,
    enabled: bool,
}

impl<E: EditorAdapter> SpellCheckSession<E> {
    /// Attach to `editor` and schedule the initial check.
    pub fn attach(mut editor: E, options: &SessionOptions, now: Instant) -> Self {
        if options.disable_native_spellcheck {
            editor.set_native_spellcheck(false);
        }

        let enabled = !editor.host_has_checker();
        if !enabled {
            tracing::debug!("another checker is active on this editor, not checking");
        }

        let mut debouncer = Debouncer::new(options.cooldown);
        if enabled {
            debouncer.schedule_now(now);
        }

        Self {
            editor,
            store: MatchStore::new(),
            debouncer,
            guard: LoopGuard::new(options.loop_guard),
            renderer: OverlayRenderer::new(),
            loading: LoadingIndicator::new(options.show_loading_indicator),
            popup: SuggestionPopup::new(options.max_suggestions),
            generation: 0,
            in_flight: None,
            own_writes: Vec::new(),
            enabled,
        }
    }

    /// Feed one entry of the editor's change stream.
    ///
    /// Text changes keep the stored matches aligned with the document; user
    /// changes also reset the debounce timer.
    pub fn handle_change(&mut self, change: &TextChange, now: Instant) {
        if !self.enabled {
            return;
        }
        if change.kind == ChangeKind::Text && self.take_own_write(change) {
            return;
        }
        if change.origin == ChangeOrigin::User && !self.debouncer.on_user_edit(now, &self.guard)
        {
            tracing::trace!("edit absorbed by loop guard");
        }
        if change.kind == ChangeKind::Text {
            self.reconcile(change, now);
        }
    }

    pub fn handle_changes<'a>(
        &mut self,
        changes: impl IntoIterator<Item = &'a TextChange>,
        now: Instant,
    ) {
        for change in changes {
            self.handle_change(change, now);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.enabled {
            self.debouncer.deadline()
        } else {
            None
        }
    }

    /// Start a check if the debounce deadline has passed and none is running.
    pub fn poll_check(&mut self, now: Instant) -> Option<CheckTicket> {
        if !self.enabled || self.in_flight.is_some() {
            return None;
        }
        if self.debouncer.poll(now) {
            tracing::debug!("user stopped typing, checking spelling");
            self.begin_check(now)
        } else {
            None
        }
    }

    /// Start a check immediately. Returns `None` for a blank document.
    pub fn begin_check(&mut self, now: Instant) -> Option<CheckTicket> {
        if !self.enabled {
            return None;
        }
        let text = self.editor.text();
        if is_blank(&text) {
            return None;
        }

        self.renderer.clear(&mut self.editor, &mut self.guard, now);
        self.set_loading(true);

        self.generation += 1;
        self.in_flight = Some(self.generation);
        Some(CheckTicket {
            generation: self.generation,
            digest: digest(&text),
            text,
        })
    }

    /// Apply the outcome of the check identified by `ticket`.
    pub fn finish_check(
        &mut self,
        ticket: CheckTicket,
        outcome: Result<Vec<Match>, CheckError>,
        now: Instant,
    ) -> CheckApplied {
        if ticket.generation != self.generation {
            tracing::debug!(generation = ticket.generation, "ignoring superseded check");
            return CheckApplied::Superseded;
        }
        self.in_flight = None;
        self.set_loading(false);

        let matches = match outcome {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "spell check failed, showing no matches");
                self.store.clear();
                self.renderer.clear(&mut self.editor, &mut self.guard, now);
                return CheckApplied::Failed;
            }
        };

        if digest(&self.editor.text()) != ticket.digest {
            tracing::debug!("document changed during check, discarding result");
            self.store.clear();
            self.debouncer.schedule_now(now);
            return CheckApplied::Discarded;
        }

        self.store.replace_all(matches);
        self.rerender(now);
        CheckApplied::Applied(self.store.len())
    }

    /// Run a full check round trip for the current document.
    pub async fn check_now<T: Transport>(
        &mut self,
        client: &CheckerClient<T>,
        now: Instant,
    ) -> Option<CheckApplied> {
        let ticket = self.begin_check(now)?;
        let outcome = client.check(&ticket.text).await;
        Some(self.finish_check(ticket, outcome, Instant::now().max(now)))
    }

    /// Wait for the debounce deadline, then check. Returns `None` when nothing is scheduled.
    pub async fn run_due<T: Transport>(
        &mut self,
        client: &CheckerClient<T>,
    ) -> Option<CheckApplied> {
        loop {
            let deadline = self.next_deadline()?;
            let now = Instant::now();
            if deadline <= now {
                break;
            }
            tokio::time::sleep(deadline - now).await;
        }

        let ticket = self.poll_check(Instant::now())?;
        let outcome = client.check(&ticket.text).await;
        Some(self.finish_check(ticket, outcome, Instant::now()))
    }

    /// Open the popup for the match a marker points at.
    pub fn activate_marker(
        &mut self,
        marker: &MarkerAttrs,
        anchor: Rect,
        viewport: Viewport,
    ) -> Result<&OpenPopup, OverlayError> {
        let key = marker.key();
        let Some(m) = self.store.find(&key) else {
            tracing::error!(?key, "marker refers to a match that is not in the store");
            self.popup.close();
            return Err(OverlayError::MarkerLookup {
                offset: key.offset,
                length: key.length,
                rule_id: key.rule_id,
            });
        };
        Ok(self.popup.open(m, anchor, viewport))
    }

    /// Open the popup for the marker covering `position`.
    pub fn activate_at(
        &mut self,
        position: usize,
        anchor: Rect,
        viewport: Viewport,
    ) -> Result<&OpenPopup, OverlayError> {
        let marker = self
            .editor
            .markers()
            .into_iter()
            .find(|placed| placed.start <= position && position < placed.end)
            .map(|placed| placed.attrs)
            .ok_or(OverlayError::MarkerLookup {
                offset: position,
                length: 0,
                rule_id: String::new(),
            })?;
        self.activate_marker(&marker, anchor, viewport)
    }

    /// Replace the popup's match with its `index`-th choice.
    pub fn accept_suggestion(&mut self, index: usize, now: Instant) -> Result<(), OverlayError> {
        let replacement = self.popup.choice(index)?.to_string();
        let key = match self.popup.current() {
            Some(popup) => popup.key.clone(),
            None => return Err(OverlayError::PopupClosed),
        };
        let end = key.offset + key.length;
        let in_place = self.editor.markers().iter().any(|placed| {
            placed.start == key.offset && placed.end == end && placed.attrs.key() == key
        });
        if self.store.find(&key).is_none() || !in_place {
            tracing::error!(?key, "match no longer sits under its marker, not replacing");
            self.popup.close();
            return Err(OverlayError::MarkerLookup {
                offset: key.offset,
                length: key.length,
                rule_id: key.rule_id,
            });
        }

        self.guard.begin_suppression(now);
        let write = self
            .editor
            .replace_range(key.offset, key.length, &replacement, ChangeOrigin::Api)?;
        self.own_writes.push(write);
        let inserted = replacement.chars().count();
        self.editor
            .set_selection(Selection::caret(key.offset + inserted));

        self.store.remove_at(&key)?;
        self.store.apply_edit(key.offset, key.length, inserted);
        self.rerender(now);
        self.popup.close();
        Ok(())
    }

    pub fn close_popup(&mut self) {
        self.popup.close();
    }

    pub fn outside_click(&mut self) {
        self.popup.close();
    }

    pub fn viewport_resized(&mut self, viewport: Viewport) {
        self.popup.reposition(viewport);
    }

    pub fn matches(&self) -> &[Match] {
        self.store.all()
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    pub fn popup(&self) -> Option<&OpenPopup> {
        self.popup.current()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn loading_visible(&self) -> bool {
        self.loading.visible()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn check_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    /// Detach: strip markers and hand the editor back.
    pub fn dispose(mut self) -> E {
        let now = Instant::now();
        self.popup.close();
        self.set_loading(false);
        self.renderer.clear(&mut self.editor, &mut self.guard, now);
        self.editor
    }

    /// Consume the echo of a write this session made itself.
    fn take_own_write(&mut self, change: &TextChange) -> bool {
        let Some(index) = self.own_writes.iter().position(|write| {
            write.offset == change.offset
                && write.deleted == change.deleted
                && write.inserted == change.inserted
        }) else {
            return false;
        };
        self.own_writes.remove(index);
        true
    }

    /// Move or drop stored matches after an edit the session did not make.
    fn reconcile(&mut self, change: &TextChange, now: Instant) {
        let inserted = change.inserted.chars().count();
        if !self.store.apply_edit(change.offset, change.deleted, inserted) {
            return;
        }
        tracing::trace!(offset = change.offset, "stored matches moved by edit");

        if let Some(key) = self.popup.current().map(|popup| popup.key.clone()) {
            if self.store.find(&key).is_none() {
                self.popup.close();
            }
        }
        // Markers stay off while a check is running.
        if self.in_flight.is_none() {
            self.rerender(now);
        }
    }

    fn rerender(&mut self, now: Instant) {
        self.renderer
            .render(&mut self.editor, self.store.all(), &mut self.guard, now);
    }

    fn set_loading(&mut self, loading: bool) {
        if loading {
            self.loading.start();
        } else {
            self.loading.stop();
        }
        self.editor.set_loading_indicator(self.loading.visible());
    }
}
