//! Fixed-point helpers shared by the accumulator and the ledger
//!
//! All operations are checked. Inputs are bounded below `ACCUMULATOR_SCALE`
//! so the dominant product `volume × Δindex` stays within one window's worth
//! of `seconds × SCALE`.

use crate::constants::ACCUMULATOR_SCALE;
use crate::error::{AccrualError, Result};
use crate::types::{Amount, Duration, IndexValue, Notional, RewardRate, Volume};

/// Validate a reported notional and return the activity it contributes
pub fn activity_magnitude(notional: Notional) -> Result<Volume> {
    let magnitude = notional.unsigned_abs();
    if magnitude == 0 {
        return Err(AccrualError::invalid("activity magnitude must be non-zero"));
    }
    if magnitude >= ACCUMULATOR_SCALE {
        return Err(AccrualError::invalid(format!(
            "activity magnitude {} must be below {}",
            magnitude, ACCUMULATOR_SCALE
        )));
    }
    Ok(magnitude)
}

/// Accumulator growth for `elapsed` seconds shared by `total_volume`
pub fn index_growth(elapsed: Duration, total_volume: Volume) -> Result<IndexValue> {
    if elapsed == 0 || total_volume == 0 {
        return Ok(0);
    }
    (elapsed as u128)
        .checked_mul(ACCUMULATOR_SCALE)
        .ok_or(AccrualError::ArithmeticOverflow)
        .map(|scaled| scaled / total_volume)
}

/// Reward earned by `volume` while the accumulator moved from `from` to `to`
///
/// Because the scale equals one whole token, `volume × Δindex` is already in
/// base-unit-seconds and only the rate fraction remains to be applied. The
/// fraction is applied as `q × num + r × num / den` with `q, r` the quotient
/// and remainder of the product by `den`, which equals the floor of
/// `product × num / den` without forming that wider intermediate.
pub fn earned(volume: Volume, from: IndexValue, to: IndexValue, rate: RewardRate) -> Result<Amount> {
    let delta = to.checked_sub(from).ok_or(AccrualError::ArithmeticOverflow)?;
    if delta == 0 || volume == 0 {
        return Ok(0);
    }
    let product = volume
        .checked_mul(delta)
        .ok_or(AccrualError::ArithmeticOverflow)?;
    apply_rate(product, rate)
}

fn apply_rate(base_unit_seconds: u128, rate: RewardRate) -> Result<Amount> {
    if rate.denominator == 0 {
        return Err(AccrualError::invalid("reward rate denominator is zero"));
    }
    let whole = (base_unit_seconds / rate.denominator)
        .checked_mul(rate.numerator)
        .ok_or(AccrualError::ArithmeticOverflow)?;
    let fraction = (base_unit_seconds % rate.denominator)
        .checked_mul(rate.numerator)
        .ok_or(AccrualError::ArithmeticOverflow)?
        / rate.denominator;
    whole
        .checked_add(fraction)
        .ok_or(AccrualError::ArithmeticOverflow)
}

/// Full emission of one window of `length` seconds at `rate`.
///
/// This is the most any single settlement can pay, since a settlement never
/// spans more than one window and `volume × Δindex ≤ length × SCALE` within it.
/// A rate and length pair accepted here can therefore never overflow `earned`.
pub fn window_emission(length: Duration, rate: RewardRate) -> Result<Amount> {
    let too_large = || {
        AccrualError::invalid(format!(
            "reward rate {}/{} over {}s windows exceeds the amount range",
            rate.numerator, rate.denominator, length
        ))
    };
    if rate.denominator == 0 {
        return Err(AccrualError::invalid("reward rate denominator is zero"));
    }
    // Bounds the remainder term of `apply_rate` for every product
    (rate.denominator - 1)
        .checked_mul(rate.numerator)
        .ok_or_else(too_large)?;
    let budget = (length as u128)
        .checked_mul(ACCUMULATOR_SCALE)
        .ok_or_else(too_large)?;
    apply_rate(budget, rate).map_err(|_| too_large())
}
