//! Clock-driven coalescing primitives: a trailing debouncer and a leading/trailing throttle.
//!
//! Neither owns a timer. Callers poll them from whatever tick the host provides and pass the
//! current time in, which keeps them deterministic under a manual clock.

/// Trailing debouncer: each `schedule` pushes the deadline out, so only the last request in a
/// burst fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.delay_ms));
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Clears and returns `true` if the deadline has passed.
    pub fn take_if_due(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Throttle that lets the first item through immediately and then at most one item per
/// interval. Items offered during the quiet period replace each other; the newest is released
/// by [`Throttle::poll`] once the interval ends.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval_ms: u64,
    last_release: Option<u64>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_release: None,
            pending: None,
        }
    }

    pub fn offer(&mut self, now_ms: u64, item: T) -> Option<T> {
        if self.is_open(now_ms) {
            self.last_release = Some(now_ms);
            self.pending = None;
            return Some(item);
        }
        self.pending = Some(item);
        None
    }

    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        if self.pending.is_some() && self.is_open(now_ms) {
            self.last_release = Some(now_ms);
            return self.pending.take();
        }
        None
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn is_open(&self, now_ms: u64) -> bool {
        self.last_release
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.interval_ms)
    }
}
