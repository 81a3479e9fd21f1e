/// Holds back render submissions until edits have been quiet for a while.
///
/// Time is passed in as milliseconds since an arbitrary epoch so the event
/// loop controls the clock.
#[derive(Debug)]
pub struct RenderDebouncer {
    delay_ms: u64,
    pending_since: Option<u64>,
}

impl RenderDebouncer {
    pub const DEFAULT_DELAY_MS: u64 = 150;

    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending_since: None,
        }
    }

    /// Record an input change; restarts the quiet period.
    pub const fn queue(&mut self, now_ms: u64) {
        self.pending_since = Some(now_ms);
    }

    /// `true` once a queued change has settled. Clears the pending state.
    pub fn take_ready(&mut self, now_ms: u64) -> bool {
        let Some(queued_at) = self.pending_since else {
            return false;
        };
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending_since = None;
            true
        } else {
            false
        }
    }

    /// Milliseconds until the pending change settles.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.pending_since
            .map(|queued_at| self.delay_ms.saturating_sub(now_ms.saturating_sub(queued_at)))
    }

    pub const fn cancel(&mut self) {
        self.pending_since = None;
    }

    pub const fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }
}

impl Default for RenderDebouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY_MS)
    }
}
