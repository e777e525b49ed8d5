//! Timing state machines for the check trigger.
//!
//! Neither type owns a timer. Callers pass the current [`Instant`] in and ask
//! for the next deadline, so the same logic runs under a UI event loop, a tokio
//! runtime or a test that fabricates instants.

use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);
pub const DEFAULT_LOOP_GUARD: Duration = Duration::from_millis(100);

/// Suppression window that absorbs the document writes made by the overlay itself.
#[derive(Debug, Clone)]
pub struct LoopGuard {
    window: Duration,
    until: Option<Instant>,
}

impl LoopGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            until: None,
        }
    }

    /// Open (or restart) the window. Call immediately before a programmatic write.
    pub fn begin_suppression(&mut self, now: Instant) {
        self.until = Some(now + self.window);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(DEFAULT_LOOP_GUARD)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { deadline: Instant },
}

/// Collapses a burst of user edits into a single check.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
        }
    }

    /// Register a user edit. Returns `false` when the edit was swallowed by the guard.
    pub fn on_user_edit(&mut self, now: Instant, guard: &LoopGuard) -> bool {
        if guard.is_active(now) {
            return false;
        }
        self.state = DebounceState::Pending {
            deadline: now + self.delay,
        };
        true
    }

    /// Arm a deadline that is already due.
    pub fn schedule_now(&mut self, now: Instant) {
        self.state = DebounceState::Pending { deadline: now };
    }

    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }

    /// Returns `true` exactly once per quiet period, when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Pending { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Pending { deadline } => Some(deadline),
            DebounceState::Idle => None,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_of_edits_fires_once() {
        let start = Instant::now();
        let guard = LoopGuard::default();
        let mut debouncer = Debouncer::new(ms(1000));

        let mut fired = 0;
        for i in 0..10 {
            let now = start + ms(i * 200);
            assert!(debouncer.on_user_edit(now, &guard));
            if debouncer.poll(now) {
                fired += 1;
            }
        }

        // Last edit at 1800ms, so nothing is due before 2800ms.
        assert!(!debouncer.poll(start + ms(2799)));
        for step in 0..20 {
            if debouncer.poll(start + ms(2800 + step * 50)) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(debouncer.state(), DebounceState::Idle);
    }

    #[test]
    fn test_edit_resets_deadline() {
        let start = Instant::now();
        let guard = LoopGuard::default();
        let mut debouncer = Debouncer::new(ms(500));

        debouncer.on_user_edit(start, &guard);
        assert_eq!(debouncer.deadline(), Some(start + ms(500)));
        debouncer.on_user_edit(start + ms(400), &guard);
        assert_eq!(debouncer.deadline(), Some(start + ms(900)));
        assert!(!debouncer.poll(start + ms(600)));
        assert!(debouncer.poll(start + ms(900)));
    }

    #[test]
    fn test_guard_swallows_edits() {
        let start = Instant::now();
        let mut guard = LoopGuard::new(ms(100));
        let mut debouncer = Debouncer::new(ms(500));

        guard.begin_suppression(start);
        assert!(!debouncer.on_user_edit(start + ms(50), &guard));
        assert_eq!(debouncer.deadline(), None);

        assert!(debouncer.on_user_edit(start + ms(100), &guard));
        assert!(debouncer.deadline().is_some());
    }

    #[test]
    fn test_guard_rearms() {
        let start = Instant::now();
        let mut guard = LoopGuard::new(ms(100));

        guard.begin_suppression(start);
        guard.begin_suppression(start + ms(80));
        assert!(guard.is_active(start + ms(150)));
        assert!(!guard.is_active(start + ms(180)));
    }

    #[test]
    fn test_schedule_now_and_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();

        debouncer.schedule_now(start);
        debouncer.cancel();
        assert!(!debouncer.poll(start + ms(10_000)));

        debouncer.schedule_now(start);
        assert!(debouncer.poll(start));
        assert!(!debouncer.poll(start));
    }
}
