//! # Trading Rewards Engine
//!
//! Wires the period manager, the market accumulator and the trader ledger
//! into the three entry points: trade reports, claims and period changes.
//!
//! Every entry point runs in two phases. The plan phase validates inputs and
//! computes all new state into local values; only when every fallible step has
//! succeeded does the commit phase write them back and emit events. A failed
//! call therefore leaves no partial effects, including no period promotion.

use crate::accumulator::{MarketAccumulator, MarketState, WindowPhase};
use crate::auth::{OperatorGate, Ownership};
use crate::config::RewardsConfig;
use crate::events::{EventRecord, RewardEvent};
use crate::ledger::{TraderAccount, TraderLedger};
use crate::period::{PendingPeriod, PeriodManager, PeriodView, Periodicity};
use crate::token::{RewardMinter, RewardToken};
use accrual_core::math;
use accrual_core::prelude::*;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of an accepted trade report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub trader: Address,
    /// Window the report was pooled into
    pub window: Window,
    /// Whether the report opened a new market window
    pub phase: WindowPhase,
    /// Reward credited to the trader by this report
    pub credited: Amount,
    pub trader_volume: Volume,
    pub market_volume: Volume,
    pub index: IndexValue,
}

/// Outcome of a claim
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub trader: Address,
    /// Reward settled by this claim
    pub credited: Amount,
    /// Amount minted to the trader
    pub minted: Amount,
}

/// Proportional trading rewards without iteration over traders
#[derive(Debug)]
pub struct TradingRewards<T = RewardToken, G = Ownership> {
    periods: PeriodManager,
    market: MarketAccumulator,
    ledger: TraderLedger,
    token: T,
    gate: G,
    /// Latest time observed by a committed operation
    clock: Timestamp,
    events: Vec<EventRecord>,
}

impl TradingRewards<RewardToken, Ownership> {
    /// Build an engine with the in-memory token and a single operator
    pub fn from_config(config: &RewardsConfig) -> Result<Self> {
        config.validate()?;
        let periods = PeriodManager::new(config.period.origin, config.period.length)?;
        Self::new(
            periods,
            config.reward.rate(),
            RewardToken::new((&config.token).into()),
            Ownership::new(config.operator.address()?),
        )
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.token.balance_of(holder)
    }

    pub fn total_supply(&self) -> Amount {
        self.token.total_supply()
    }
}

impl<T: RewardMinter, G: OperatorGate> TradingRewards<T, G> {
    /// Rejects a rate whose full-window emission would not fit in `Amount`.
    pub fn new(periods: PeriodManager, rate: RewardRate, token: T, gate: G) -> Result<Self> {
        math::window_emission(periods.current().length, rate)?;
        tracing::info!(
            "Rewards engine created: origin {}, window {}s, rate {}/{} tokens/s",
            periods.current().origin,
            periods.current().length,
            rate.numerator,
            rate.denominator
        );
        Ok(Self {
            periods,
            market: MarketAccumulator::new(),
            ledger: TraderLedger::new(rate),
            token,
            gate,
            clock: 0,
            events: Vec::new(),
        })
    }

    // === Entry points ===

    /// Record a position change of `notional` by `trader`, reported by the operator.
    pub fn report_trade(
        &mut self,
        caller: Address,
        trader: Address,
        notional: Notional,
        now: Timestamp,
    ) -> Result<TradeReceipt> {
        self.gate.ensure_authorized(&caller)?;
        let magnitude = math::activity_magnitude(notional)?;
        self.ensure_monotonic(now)?;

        let view = self.periods.observe(now)?;
        let update = self.market.plan_report(magnitude, now, view.window)?;
        let settlement =
            self.ledger
                .plan_trade(trader, magnitude, view.window, update.index(), &self.market)?;

        self.apply_period(&view, now);
        let receipt = TradeReceipt {
            trader,
            window: view.window,
            phase: update.phase,
            credited: settlement.credited,
            trader_volume: settlement.next.last_volume,
            market_volume: update.next.total_volume,
            index: update.index(),
        };
        self.market.commit(update);
        self.ledger.commit_trade(&settlement);

        tracing::info!(
            "Trade by {} of {} in window {}: credited {}",
            trader,
            notional,
            view.window,
            settlement.credited
        );
        self.emit(
            now,
            RewardEvent::ActivityReported {
                operator: caller,
                trader,
                notional,
                credited: settlement.credited,
            },
        );
        Ok(receipt)
    }

    /// Settle and mint everything `trader` has earned over closed windows.
    pub fn claim(&mut self, trader: Address, now: Timestamp) -> Result<ClaimReceipt> {
        self.ensure_monotonic(now)?;

        let view = self.periods.observe(now)?;
        let settlement = self
            .ledger
            .plan_claim(trader, view.window, &self.market)
            .map_err(|err| {
                tracing::warn!("Claim by {} rejected: {}", trader, err);
                err
            })?;

        self.apply_period(&view, now);
        self.ledger.commit_claim(&settlement);
        self.token.mint(trader, settlement.minted);

        tracing::info!(
            "Claim by {}: credited {}, minted {}",
            trader,
            settlement.credited,
            settlement.minted
        );
        self.emit(
            now,
            RewardEvent::ClaimSettled {
                trader,
                credited: settlement.credited,
                minted: settlement.minted,
            },
        );
        Ok(ClaimReceipt {
            trader,
            credited: settlement.credited,
            minted: settlement.minted,
        })
    }

    /// Queue a new window length, effective from the end of the current window.
    pub fn request_period_change(
        &mut self,
        caller: Address,
        new_length: Duration,
        now: Timestamp,
    ) -> Result<PendingPeriod> {
        self.gate.ensure_authorized(&caller)?;
        self.ensure_monotonic(now)?;

        let (view, pending) = self.periods.plan_change(new_length, now)?;
        math::window_emission(new_length, self.ledger.rate())?;
        if let Some(change) = self.periods.commit_change(&view, pending) {
            self.emit(now, change.into());
        }
        self.clock = now;
        self.emit(
            now,
            RewardEvent::PeriodChangeRequested {
                effective_at: pending.effective_at,
                new_length: pending.length,
            },
        );
        Ok(pending)
    }

    /// Hand the operator role to `new_operator`
    pub fn transfer_operator(&mut self, caller: Address, new_operator: Address) -> Result<()> {
        self.gate.transfer(&caller, new_operator)
    }

    // === Queries ===

    pub fn periodicity(&self) -> Periodicity {
        self.periods.current()
    }

    pub fn pending_period(&self) -> Option<PendingPeriod> {
        self.periods.pending()
    }

    /// Window containing `now`, as the next operation at `now` would see it
    pub fn current_window(&self, now: Timestamp) -> Result<Window> {
        Ok(self.periods.observe(now)?.window)
    }

    pub fn account(&self, trader: &Address) -> TraderAccount {
        self.ledger.account(trader)
    }

    pub fn market(&self) -> MarketState {
        self.market.state()
    }

    /// Index value frozen at a window boundary
    pub fn snapshot_at(&self, boundary: Timestamp) -> Option<IndexValue> {
        self.market.snapshot(boundary)
    }

    /// Amount a claim by `trader` at `now` would mint
    pub fn preview_claim(&self, trader: &Address, now: Timestamp) -> Result<Amount> {
        let view = self.periods.observe(now)?;
        Ok(self.ledger.plan_claim(*trader, view.window, &self.market)?.minted)
    }

    pub fn rate(&self) -> RewardRate {
        self.ledger.rate()
    }

    pub fn participant_count(&self) -> usize {
        self.ledger.participant_count()
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Drain the event log
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    // === Internals ===

    fn ensure_monotonic(&self, now: Timestamp) -> Result<()> {
        if now < self.clock {
            return Err(AccrualError::invalid(format!(
                "timestamp {} precedes last operation at {}",
                now, self.clock
            )));
        }
        Ok(())
    }

    /// Commit the period observation of a successful operation
    fn apply_period(&mut self, view: &PeriodView, now: Timestamp) {
        if let Some(change) = self.periods.commit(view) {
            self.emit(now, change.into());
        }
        self.clock = now;
    }

    fn emit(&mut self, at: Timestamp, event: RewardEvent) {
        tracing::debug!("Event at {}: {:?}", at, event);
        self.events.push(EventRecord { at, event });
    }
}

/// Thread-safe handle; every call holds the lock for the whole operation
pub struct SharedRewards<T = RewardToken, G = Ownership> {
    inner: Arc<Mutex<TradingRewards<T, G>>>,
}

impl<T, G> Clone for SharedRewards<T, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: RewardMinter, G: OperatorGate> SharedRewards<T, G> {
    pub fn new(engine: TradingRewards<T, G>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn report_trade(
        &self,
        caller: Address,
        trader: Address,
        notional: Notional,
        now: Timestamp,
    ) -> Result<TradeReceipt> {
        self.inner.lock().report_trade(caller, trader, notional, now)
    }

    pub fn claim(&self, trader: Address, now: Timestamp) -> Result<ClaimReceipt> {
        self.inner.lock().claim(trader, now)
    }

    pub fn request_period_change(
        &self,
        caller: Address,
        new_length: Duration,
        now: Timestamp,
    ) -> Result<PendingPeriod> {
        self.inner.lock().request_period_change(caller, new_length, now)
    }

    /// Run a read-only closure against the engine
    pub fn with<R>(&self, f: impl FnOnce(&TradingRewards<T, G>) -> R) -> R {
        f(&self.inner.lock())
    }
}
