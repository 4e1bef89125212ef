//! Staleness guard for recomputation results.
//!
//! Every recomputation request takes a fresh [`RenderToken`] from a shared
//! [`StalenessGuard`]. Work that finishes later hands its result back
//! together with the token it captured; the result is applied only while
//! that token is still the latest one issued.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic identifier of one recomputation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderToken(u64);

impl RenderToken {
    /// Raw counter value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RenderToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues tokens and answers whether a captured token is still current.
///
/// Clones share the same counter, so a background task can hold its own
/// handle.
#[derive(Debug, Clone, Default)]
pub struct StalenessGuard {
    counter: Arc<AtomicU64>,
}

impl StalenessGuard {
    /// Create a guard whose first issued token is `#1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, invalidating every earlier one.
    pub fn issue(&self) -> RenderToken {
        RenderToken(self.counter.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// The latest issued token (`#0` before the first request).
    #[must_use]
    pub fn current(&self) -> RenderToken {
        RenderToken(self.counter.load(Ordering::Acquire))
    }

    /// Whether no newer token has been issued since `token`.
    #[must_use]
    pub fn is_current(&self, token: RenderToken) -> bool {
        self.current() == token
    }
}

/// Holds the most recently applied result of some out-of-band work.
#[derive(Debug, Clone)]
pub struct LatestSlot<T> {
    guard: StalenessGuard,
    applied: Option<(RenderToken, T)>,
}

impl<T> LatestSlot<T> {
    /// Empty slot checked against `guard`.
    #[must_use]
    pub fn new(guard: StalenessGuard) -> Self {
        Self {
            guard,
            applied: None,
        }
    }

    /// Apply `value` if `token` is still current. Returns whether it was
    /// applied; a stale value is dropped.
    pub fn offer(&mut self, token: RenderToken, value: T) -> bool {
        if !self.guard.is_current(token) {
            tracing::debug!(
                %token,
                current = %self.guard.current(),
                "Discarding stale result"
            );
            return false;
        }
        self.applied = Some((token, value));
        true
    }

    /// The applied value, if any.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.applied.as_ref().map(|(_, v)| v)
    }

    /// Token of the applied value.
    #[must_use]
    pub fn token(&self) -> Option<RenderToken> {
        self.applied.as_ref().map(|(t, _)| *t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increase() {
        let guard = StalenessGuard::new();
        assert_eq!(guard.current().get(), 0);
        let t1 = guard.issue();
        let t2 = guard.issue();
        assert!(t2 > t1);
        assert!(!guard.is_current(t1));
        assert!(guard.is_current(t2));
    }

    #[test]
    fn test_late_older_result_is_discarded() {
        let guard = StalenessGuard::new();
        let mut slot = LatestSlot::new(guard.clone());

        let t1 = guard.issue();
        let t2 = guard.issue();

        assert!(slot.offer(t2, "second"));
        assert!(!slot.offer(t1, "first"));
        assert_eq!(slot.get(), Some(&"second"));
        assert_eq!(slot.token(), Some(t2));
    }

    #[test]
    fn test_in_order_results_replace_each_other() {
        let guard = StalenessGuard::new();
        let mut slot = LatestSlot::new(guard.clone());

        let t1 = guard.issue();
        assert!(slot.offer(t1, 1));
        let t2 = guard.issue();
        assert!(slot.offer(t2, 2));
        assert_eq!(slot.get(), Some(&2));
    }

    #[test]
    fn test_clones_share_counter() {
        let guard = StalenessGuard::new();
        let handle = guard.clone();
        let token = handle.issue();
        assert!(guard.is_current(token));
        guard.issue();
        assert!(!handle.is_current(token));
    }
}
