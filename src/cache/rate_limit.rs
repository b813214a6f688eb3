use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    Deny { reset_in: Duration },
}

impl RateDecision {
    /// Whole seconds until the caller's window resets, at least one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            RateDecision::Allow => None,
            RateDecision::Deny { reset_in } => {
                let secs = reset_in.as_secs() + u64::from(reset_in.subsec_nanos() > 0);
                Some(secs.max(1))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Fixed window per caller, reset once the window has fully elapsed.
///
/// Each check runs under the map's per-key lock, so the count never exceeds
/// the limit inside a window. A limit of zero disables limiting.
pub struct RateLimiter {
    windows: DashMap<String, WindowState>,
    limit: u32,
    window: Duration,
    max_keys: usize,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration, max_keys: usize) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
            max_keys: max_keys.max(1),
        }
    }

    pub fn check(&self, caller: &str) -> RateDecision {
        self.check_at(caller, Instant::now())
    }

    pub fn check_at(&self, caller: &str, now: Instant) -> RateDecision {
        if self.limit == 0 {
            return RateDecision::Allow;
        }

        if !self.windows.contains_key(caller) && self.windows.len() >= self.max_keys {
            self.sweep_at(now);
            if self.windows.len() >= self.max_keys {
                self.evict_oldest();
            }
        }

        let mut state = self
            .windows
            .entry(caller.to_string())
            .or_insert(WindowState {
                count: 0,
                window_start: now,
            });

        let elapsed = now.saturating_duration_since(state.window_start);
        if state.count == 0 || elapsed > self.window {
            state.count = 1;
            state.window_start = now;
            return RateDecision::Allow;
        }

        if state.count >= self.limit {
            return RateDecision::Deny {
                reset_in: self.window.saturating_sub(elapsed),
            };
        }

        state.count += 1;
        RateDecision::Allow
    }

    /// Drops windows that have already elapsed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, state| now.saturating_duration_since(state.window_start) <= self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_callers(&self) -> usize {
        self.windows.len()
    }

    fn evict_oldest(&self) {
        let victim = self
            .windows
            .iter()
            .min_by_key(|entry| entry.window_start)
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            self.windows.remove(&key);
        }
    }
}
