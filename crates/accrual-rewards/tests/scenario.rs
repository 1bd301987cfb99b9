//! Integration tests replaying the reference trading scenario
//!
//! Window length 2,592,000s, rate 0.387 tokens/s:
//! A opens 100,000 at t=0, B opens 50,000 at t=86,400, C opens 100,000 at
//! t=172,800 and B partially closes 25,000 at t=259,200.

use accrual_rewards::*;

const WINDOW: u64 = 2_592_000;
const T1: u64 = 86_400;
const T2: u64 = 172_800;
const T3: u64 = 259_200;

/// Accepted rounding error per settlement, in base units
const TOLERANCE: u128 = 1_000_000;

/// Base units emitted per second at 0.387 tokens/s
const RATE_PER_SECOND: u128 = 387_000_000_000_000_000;

fn exchange() -> Address {
    Address::from_label("exchange")
}

fn trader(name: &str) -> Address {
    Address::from_label(name)
}

fn engine() -> TradingRewards {
    let config = RewardsConfig::from_toml_str(&format!(
        "[period]\norigin = 0\nlength = {}\n\n[operator]\naddress = \"exchange\"\n",
        WINDOW
    ))
    .unwrap();
    TradingRewards::from_config(&config).unwrap()
}

/// Exact reward of a trader over `(seconds, own volume, market volume)` segments
fn expected(segments: &[(u64, u128, u128)]) -> u128 {
    segments
        .iter()
        .map(|&(seconds, own, total)| RATE_PER_SECOND * seconds as u128 * own / total)
        .sum()
}

fn assert_close(actual: u128, expected: u128) {
    let diff = actual.abs_diff(expected);
    assert!(
        diff <= TOLERANCE,
        "reward {} differs from {} by {}",
        actual,
        expected,
        diff
    );
}

fn run_scenario(engine: &mut TradingRewards) {
    engine.report_trade(exchange(), trader("a"), 100_000, 0).unwrap();
    engine.report_trade(exchange(), trader("b"), 50_000, T1).unwrap();
    engine.report_trade(exchange(), trader("c"), 100_000, T2).unwrap();
    engine.report_trade(exchange(), trader("b"), -25_000, T3).unwrap();
}

#[test]
fn test_window_volumes() {
    let mut engine = engine();
    run_scenario(&mut engine);

    assert_eq!(engine.account(&trader("a")).last_volume, 100_000);
    assert_eq!(engine.account(&trader("b")).last_volume, 75_000);
    assert_eq!(engine.account(&trader("c")).last_volume, 100_000);
    assert_eq!(engine.market().total_volume, 275_000);
    assert_eq!(engine.market().last_active_window_end, WINDOW);
    assert_eq!(engine.market().last_update, T3);
}

#[test]
fn test_partial_close_credits_elapsed_share() {
    let mut engine = engine();
    engine.report_trade(exchange(), trader("a"), 100_000, 0).unwrap();
    engine.report_trade(exchange(), trader("b"), 50_000, T1).unwrap();
    engine.report_trade(exchange(), trader("c"), 100_000, T2).unwrap();
    let receipt = engine
        .report_trade(exchange(), trader("b"), -25_000, T3)
        .unwrap();

    let b_so_far = expected(&[(T2 - T1, 50_000, 150_000), (T3 - T2, 50_000, 250_000)]);
    assert_close(receipt.credited, b_so_far);
    assert_eq!(receipt.trader_volume, 75_000);
    assert_eq!(receipt.market_volume, 275_000);
    assert_eq!(engine.account(&trader("b")).pending_reward, receipt.credited);
}

#[test]
fn test_claims_after_window_close() {
    let mut engine = engine();
    run_scenario(&mut engine);

    let a = engine.claim(trader("a"), WINDOW).unwrap();
    let b = engine.claim(trader("b"), WINDOW).unwrap();
    let c = engine.claim(trader("c"), WINDOW).unwrap();

    let rest = WINDOW - T3;
    assert_close(
        a.minted,
        expected(&[
            (T1, 100_000, 100_000),
            (T2 - T1, 100_000, 150_000),
            (T3 - T2, 100_000, 250_000),
            (rest, 100_000, 275_000),
        ]),
    );
    assert_close(
        b.minted,
        expected(&[
            (T2 - T1, 50_000, 150_000),
            (T3 - T2, 50_000, 250_000),
            (rest, 75_000, 275_000),
        ]),
    );
    assert_close(
        c.minted,
        expected(&[(T3 - T2, 100_000, 250_000), (rest, 100_000, 275_000)]),
    );

    // The whole window budget is distributed, minus rounding
    let budget = RATE_PER_SECOND * WINDOW as u128;
    let supply = engine.total_supply();
    assert!(supply <= budget);
    assert_close(supply, budget);

    assert_eq!(engine.balance_of(&trader("a")), a.minted);
    assert_eq!(engine.balance_of(&trader("b")), b.minted);
    assert_eq!(engine.balance_of(&trader("c")), c.minted);
}

#[test]
fn test_claim_inside_window_mints_only_credited() {
    let mut engine = engine();
    run_scenario(&mut engine);

    let credited = engine.account(&trader("b")).pending_reward;
    let receipt = engine.claim(trader("b"), T3 + 10).unwrap();
    assert_eq!(receipt.credited, 0);
    assert_eq!(receipt.minted, credited);

    let receipt = engine.claim(trader("a"), T3 + 10).unwrap();
    assert_eq!(receipt.minted, 0);
}

#[test]
fn test_events_describe_the_scenario() {
    let mut engine = engine();
    run_scenario(&mut engine);
    engine.claim(trader("a"), WINDOW + 1).unwrap();

    let events = engine.take_events();
    assert_eq!(events.len(), 5);
    assert_eq!(
        events[3].event,
        RewardEvent::ActivityReported {
            operator: exchange(),
            trader: trader("b"),
            notional: -25_000,
            credited: engine.account(&trader("b")).pending_reward,
        }
    );
    match &events[4].event {
        RewardEvent::ClaimSettled { trader: who, credited, minted } => {
            assert_eq!(*who, trader("a"));
            assert_eq!(credited, minted);
            assert_eq!(*minted, engine.balance_of(&trader("a")));
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(events[4].at, WINDOW + 1);
    assert!(engine.events().is_empty());
}
