//! Observable events emitted by the rewards engine

use crate::period::PeriodChange;
use accrual_core::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardEvent {
    ActivityReported {
        operator: Address,
        trader: Address,
        notional: Notional,
        /// Reward credited to the trader by this report
        credited: Amount,
    },
    ClaimSettled {
        trader: Address,
        /// Reward settled by the claim itself
        credited: Amount,
        minted: Amount,
    },
    PeriodChangeRequested {
        effective_at: Timestamp,
        new_length: Duration,
    },
    PeriodChangeApplied {
        old_origin: Timestamp,
        old_length: Duration,
        new_origin: Timestamp,
        new_length: Duration,
    },
}

impl From<PeriodChange> for RewardEvent {
    fn from(change: PeriodChange) -> Self {
        Self::PeriodChangeApplied {
            old_origin: change.old.origin,
            old_length: change.old.length,
            new_origin: change.new.origin,
            new_length: change.new.length,
        }
    }
}

/// Event with the time of the operation that emitted it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub at: Timestamp,
    pub event: RewardEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Periodicity;

    #[test]
    fn test_period_change_event() {
        let change = PeriodChange {
            old: Periodicity { origin: 0, length: 10 },
            new: Periodicity { origin: 10, length: 5 },
        };
        assert_eq!(
            RewardEvent::from(change),
            RewardEvent::PeriodChangeApplied {
                old_origin: 0,
                old_length: 10,
                new_origin: 10,
                new_length: 5,
            }
        );
    }

    #[test]
    fn test_event_serialization() {
        let record = EventRecord {
            at: 42,
            event: RewardEvent::PeriodChangeRequested {
                effective_at: 100,
                new_length: 7,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["at"], 42);
        assert_eq!(json["event"]["period_change_requested"]["new_length"], 7);

        let text = serde_json::to_string(&record).unwrap();
        let back: EventRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }
}
