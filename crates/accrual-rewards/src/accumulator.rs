//! # Market Activity Accumulator
//!
//! A single monotonic index encodes "seconds elapsed per unit of concurrent
//! market activity". A trader with volume `v` earns `v × Δindex` reward-seconds
//! between two observations, which settles proportional shares without ever
//! visiting the trader set.
//!
//! ## Window roll-over
//!
//! Market volume is pooled per window and reset on the first report of a new
//! window. Growth is only accrued up to the close of the window in which the
//! pooled volume was reported; the value at that close is frozen in a sparse,
//! first-writer-wins snapshot table so traders whose last activity predates
//! the close can still be settled for the rest of their window.
//!
//! ```text
//!   window k (volume V)              window k+3
//!   ├─── r1 ─── r2 ───────┤ dead │ dead ├─ r3 ──►
//!                         ▲                ▲
//!        snapshot[end_k] = index + (end_k − r2)/V
//!                                  snapshot[start_k+3] = same value
//! ```

use accrual_core::math;
use accrual_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relation between an observed window and the last window with activity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowPhase {
    /// Still inside the last active window: volumes add up
    Continuing,
    /// A new window began since the last activity: volumes restart
    Rolled,
}

impl WindowPhase {
    pub fn between(window_start: Timestamp, last_active_window_end: Timestamp) -> Self {
        if window_start < last_active_window_end {
            Self::Continuing
        } else {
            Self::Rolled
        }
    }

    /// Pooled volume after adding `magnitude` under this phase
    pub fn pooled(self, previous: Volume, magnitude: Volume) -> Result<Volume> {
        match self {
            Self::Continuing => previous
                .checked_add(magnitude)
                .ok_or(AccrualError::ArithmeticOverflow),
            Self::Rolled => Ok(magnitude),
        }
    }
}

/// Global activity registers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    /// Monotonic time-per-activity index
    pub index: IndexValue,
    /// Activity reported within the current window
    pub total_volume: Volume,
    /// Time of the last activity report
    pub last_update: Timestamp,
    /// End of the window of the last activity report (0 before any)
    pub last_active_window_end: Timestamp,
}

/// Planned effect of one activity report, not yet committed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketUpdate {
    pub phase: WindowPhase,
    pub next: MarketState,
    snapshots: Vec<(Timestamp, IndexValue)>,
}

impl MarketUpdate {
    /// Index value after this report
    pub fn index(&self) -> IndexValue {
        self.next.index
    }
}

/// Global accumulator plus its window snapshots
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MarketAccumulator {
    state: MarketState,
    snapshots: BTreeMap<Timestamp, IndexValue>,
}

impl MarketAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MarketState {
        self.state
    }

    pub fn index(&self) -> IndexValue {
        self.state.index
    }

    /// Frozen index value recorded under a window boundary
    pub fn snapshot(&self, boundary: Timestamp) -> Option<IndexValue> {
        self.snapshots.get(&boundary).copied()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Reject observations older than the last report
    pub fn ensure_not_before_last_update(&self, now: Timestamp) -> Result<()> {
        if now < self.state.last_update {
            return Err(AccrualError::invalid(format!(
                "timestamp {} precedes last market update {}",
                now, self.state.last_update
            )));
        }
        Ok(())
    }

    /// Compute the effect of an activity report of `magnitude` at `now`.
    ///
    /// Growth is accrued under the volume in effect before this report, and
    /// only up to the close of the last active window if a new one began.
    pub fn plan_report(&self, magnitude: Volume, now: Timestamp, window: Window) -> Result<MarketUpdate> {
        self.ensure_not_before_last_update(now)?;

        let state = self.state;
        let phase = WindowPhase::between(window.start, state.last_active_window_end);
        let mut index = state.index;
        let mut snapshots = Vec::with_capacity(2);

        if state.total_volume > 0 {
            let end = match phase {
                WindowPhase::Continuing => now,
                WindowPhase::Rolled => state.last_active_window_end,
            };
            let growth = math::index_growth(end.saturating_sub(state.last_update), state.total_volume)?;
            index = index
                .checked_add(growth)
                .ok_or(AccrualError::ArithmeticOverflow)?;
            if phase == WindowPhase::Rolled {
                snapshots.push((state.last_active_window_end, index));
            }
        }
        snapshots.push((window.start, index));

        let next = MarketState {
            index,
            total_volume: phase.pooled(state.total_volume, magnitude)?,
            last_update: now,
            last_active_window_end: window.end,
        };

        tracing::debug!(
            "Market report planned: phase {:?}, index {} -> {}, volume {} -> {}",
            phase,
            state.index,
            next.index,
            state.total_volume,
            next.total_volume
        );

        Ok(MarketUpdate {
            phase,
            next,
            snapshots,
        })
    }

    pub fn commit(&mut self, update: MarketUpdate) {
        for (boundary, value) in update.snapshots {
            self.snapshots.entry(boundary).or_insert(value);
        }
        self.state = update.next;
    }

    /// Index value at the close of a past window ending at `boundary`.
    ///
    /// Uses the recorded snapshot, or extrapolates the last active window to
    /// its close when no report has happened since.
    pub fn window_close_index(&self, boundary: Timestamp) -> Result<IndexValue> {
        if let Some(value) = self.snapshot(boundary) {
            return Ok(value);
        }
        if boundary != self.state.last_active_window_end {
            return Err(AccrualError::invalid(format!(
                "no index snapshot recorded at {}",
                boundary
            )));
        }
        let growth = math::index_growth(
            boundary.saturating_sub(self.state.last_update),
            self.state.total_volume,
        )?;
        self.state
            .index
            .checked_add(growth)
            .ok_or(AccrualError::ArithmeticOverflow)
    }
}
