//! # Period Manager
//!
//! Windows are `[origin + k·length, origin + (k+1)·length)` for `k ≥ 0`.
//!
//! A length change is never applied to the window in progress: it is queued
//! as a pending periodicity whose origin is the end of the current window,
//! and promoted by the first observation at or after that instant.
//!
//! ```text
//!   request(len')          first observation ≥ effective_at
//!       │                          │
//!   ────┼──────────────┬───────────┼──────────────────►
//!       current window │ effective_at: origin' = end, length' = len'
//! ```

use accrual_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Active window configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Periodicity {
    /// Start of window `k = 0`
    pub origin: Timestamp,
    /// Window length in seconds, always > 0
    pub length: Duration,
}

impl Periodicity {
    pub fn new(origin: Timestamp, length: Duration) -> Result<Self> {
        if length == 0 {
            return Err(AccrualError::invalid("window length must be non-zero"));
        }
        Ok(Self { origin, length })
    }

    /// Window containing `now`
    pub fn window_at(&self, now: Timestamp) -> Result<Window> {
        if now < self.origin {
            return Err(AccrualError::invalid(format!(
                "timestamp {} precedes period origin {}",
                now, self.origin
            )));
        }
        let k = (now - self.origin) / self.length;
        let start = k
            .checked_mul(self.length)
            .and_then(|offset| offset.checked_add(self.origin))
            .ok_or(AccrualError::ArithmeticOverflow)?;
        let end = start
            .checked_add(self.length)
            .ok_or(AccrualError::ArithmeticOverflow)?;
        Ok(Window::new(start, end))
    }
}

/// Queued replacement for the current periodicity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPeriod {
    /// End of the window that was active when the change was requested
    pub effective_at: Timestamp,
    pub length: Duration,
}

impl PendingPeriod {
    fn periodicity(&self) -> Periodicity {
        Periodicity {
            origin: self.effective_at,
            length: self.length,
        }
    }
}

/// A promotion of the pending periodicity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodChange {
    pub old: Periodicity,
    pub new: Periodicity,
}

/// Result of observing the clock, not yet committed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodView {
    /// Periodicity governing this operation
    pub periodicity: Periodicity,
    /// Window containing the observed instant
    pub window: Window,
    /// Set when this observation promotes the pending change
    pub promoted: Option<PeriodChange>,
}

/// Owner of the current and pending window configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeriodManager {
    current: Periodicity,
    pending: Option<PendingPeriod>,
}

impl PeriodManager {
    pub fn new(origin: Timestamp, length: Duration) -> Result<Self> {
        Ok(Self {
            current: Periodicity::new(origin, length)?,
            pending: None,
        })
    }

    /// Currently effective periodicity (ignores a due but unpromoted change)
    pub fn current(&self) -> Periodicity {
        self.current
    }

    pub fn pending(&self) -> Option<PendingPeriod> {
        self.pending
    }

    /// Compute the boundaries at `now` as the operation will see them.
    ///
    /// Pure: the promotion, if any, is only applied by [`PeriodManager::commit`].
    pub fn observe(&self, now: Timestamp) -> Result<PeriodView> {
        let (periodicity, promoted) = match self.pending {
            Some(pending) if pending.effective_at <= now => {
                let new = pending.periodicity();
                (new, Some(PeriodChange { old: self.current, new }))
            }
            _ => (self.current, None),
        };
        Ok(PeriodView {
            periodicity,
            window: periodicity.window_at(now)?,
            promoted,
        })
    }

    /// Apply the promotion carried by an observation
    pub fn commit(&mut self, view: &PeriodView) -> Option<PeriodChange> {
        let change = view.promoted?;
        tracing::info!(
            "Period change applied: origin {} length {} -> origin {} length {}",
            change.old.origin,
            change.old.length,
            change.new.origin,
            change.new.length
        );
        self.current = change.new;
        self.pending = None;
        Some(change)
    }

    /// Observe and commit in one step
    pub fn current_boundaries(&mut self, now: Timestamp) -> Result<(PeriodView, Option<PeriodChange>)> {
        let view = self.observe(now)?;
        let change = self.commit(&view);
        Ok((view, change))
    }

    /// Validate a length change and compute the pending entry it would queue
    pub fn plan_change(&self, new_length: Duration, now: Timestamp) -> Result<(PeriodView, PendingPeriod)> {
        if new_length == 0 {
            return Err(AccrualError::invalid("window length must be non-zero"));
        }
        let view = self.observe(now)?;
        let pending = PendingPeriod {
            effective_at: view.window.end,
            length: new_length,
        };
        Ok((view, pending))
    }

    /// Queue a pending change, replacing any unapplied one
    pub fn commit_change(&mut self, view: &PeriodView, pending: PendingPeriod) -> Option<PeriodChange> {
        let change = self.commit(view);
        if let Some(replaced) = self.pending.replace(pending) {
            tracing::debug!(
                "Replacing unapplied period change (effective {}, length {})",
                replaced.effective_at,
                replaced.length
            );
        }
        tracing::info!(
            "Period change requested: length {} effective at {}",
            pending.length,
            pending.effective_at
        );
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;

    #[test]
    fn test_window_boundaries() {
        let manager = PeriodManager::new(1_000, DAY).unwrap();
        let view = manager.observe(1_000).unwrap();
        assert_eq!(view.window, Window::new(1_000, 1_000 + DAY));

        let view = manager.observe(1_000 + DAY).unwrap();
        assert_eq!(view.window, Window::new(1_000 + DAY, 1_000 + 2 * DAY));

        let view = manager.observe(1_000 + 5 * DAY + 7).unwrap();
        assert_eq!(view.window.start, 1_000 + 5 * DAY);
        assert!(view.promoted.is_none());
    }

    #[test]
    fn test_rejects_zero_length_and_early_timestamps() {
        assert!(PeriodManager::new(0, 0).is_err());

        let manager = PeriodManager::new(1_000, DAY).unwrap();
        assert!(matches!(
            manager.observe(999),
            Err(AccrualError::InvalidArgument(_))
        ));
        assert!(manager.plan_change(0, 1_000).is_err());
    }

    #[test]
    fn test_change_takes_effect_at_window_end() {
        let mut manager = PeriodManager::new(0, 10 * DAY).unwrap();
        let (view, pending) = manager.plan_change(DAY, 3 * DAY).unwrap();
        assert_eq!(pending.effective_at, 10 * DAY);
        assert!(manager.commit_change(&view, pending).is_none());

        // Still the old window until the close
        let (view, change) = manager.current_boundaries(10 * DAY - 1).unwrap();
        assert_eq!(view.window, Window::new(0, 10 * DAY));
        assert!(change.is_none());

        let (view, change) = manager.current_boundaries(10 * DAY).unwrap();
        assert_eq!(view.window, Window::new(10 * DAY, 11 * DAY));
        let change = change.unwrap();
        assert_eq!(change.old, Periodicity { origin: 0, length: 10 * DAY });
        assert_eq!(change.new, Periodicity { origin: 10 * DAY, length: DAY });
        assert!(manager.pending().is_none());

        // Promotion happens once
        let (_, change) = manager.current_boundaries(10 * DAY + 1).unwrap();
        assert!(change.is_none());
    }

    #[test]
    fn test_promotion_after_skipped_windows() {
        let mut manager = PeriodManager::new(0, 10).unwrap();
        let (view, pending) = manager.plan_change(3, 5).unwrap();
        manager.commit_change(&view, pending);

        let (view, change) = manager.current_boundaries(47).unwrap();
        assert!(change.is_some());
        // origin 10, length 3: windows 10, 13, ..., 46
        assert_eq!(view.window, Window::new(46, 49));
    }

    #[test]
    fn test_new_request_overwrites_pending() {
        let mut manager = PeriodManager::new(0, 100).unwrap();
        let (view, pending) = manager.plan_change(50, 10).unwrap();
        manager.commit_change(&view, pending);
        let (view, pending) = manager.plan_change(20, 20).unwrap();
        manager.commit_change(&view, pending);

        assert_eq!(
            manager.pending(),
            Some(PendingPeriod { effective_at: 100, length: 20 })
        );
    }

    #[test]
    fn test_observe_does_not_commit() {
        let mut manager = PeriodManager::new(0, 100).unwrap();
        let (view, pending) = manager.plan_change(50, 10).unwrap();
        manager.commit_change(&view, pending);

        let view = manager.observe(150).unwrap();
        assert!(view.promoted.is_some());
        assert_eq!(manager.current().length, 100);
        assert!(manager.pending().is_some());
    }
}
