//! Liquidity math for concentrated positions
//!
//! Converts between deposit amounts, liquidity and Q64.64 sqrt prices.

use crate::constants::Q64;
use crate::errors::{CoreResult, MemeCoreError};
use crate::math::safe_math::safe_cast_u256_to_u128;
use ethnum::U256;
use orca_whirlpools_core::{try_get_amount_delta_a, try_get_amount_delta_b, U128};

/// Liquidity supported by `amount0` over `[sqrt_price_a, sqrt_price_b]`
pub fn liquidity_for_amount0(
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    amount0: u64,
) -> CoreResult<u128> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b)?;
    let intermediate = U256::from(lower) * U256::from(upper) / U256::from(Q64);
    let liquidity = U256::from(amount0) * intermediate / U256::from(upper - lower);
    safe_cast_u256_to_u128(liquidity)
}

/// Liquidity supported by `amount1` over `[sqrt_price_a, sqrt_price_b]`
pub fn liquidity_for_amount1(
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    amount1: u64,
) -> CoreResult<u128> {
    let (lower, upper) = ordered(sqrt_price_a, sqrt_price_b)?;
    let liquidity = U256::from(amount1) * U256::from(Q64) / U256::from(upper - lower);
    safe_cast_u256_to_u128(liquidity)
}

/// Maximum liquidity both amounts can back at the current price
pub fn liquidity_for_amounts(
    sqrt_price: u128,
    sqrt_price_lower: u128,
    sqrt_price_upper: u128,
    amount0: u64,
    amount1: u64,
) -> CoreResult<u128> {
    if sqrt_price_lower >= sqrt_price_upper {
        return Err(MemeCoreError::InvalidPrice);
    }

    if sqrt_price <= sqrt_price_lower {
        return liquidity_for_amount0(sqrt_price_lower, sqrt_price_upper, amount0);
    }
    if sqrt_price >= sqrt_price_upper {
        return liquidity_for_amount1(sqrt_price_lower, sqrt_price_upper, amount1);
    }

    let liquidity0 = liquidity_for_amount0(sqrt_price, sqrt_price_upper, amount0)?;
    let liquidity1 = liquidity_for_amount1(sqrt_price_lower, sqrt_price, amount1)?;
    Ok(liquidity0.min(liquidity1))
}

/// Token amounts represented by `liquidity` at the current price
pub fn amounts_for_liquidity(
    sqrt_price: u128,
    sqrt_price_lower: u128,
    sqrt_price_upper: u128,
    liquidity: u128,
    round_up: bool,
) -> CoreResult<(u64, u64)> {
    if liquidity == 0 {
        return Ok((0, 0));
    }
    if sqrt_price_lower >= sqrt_price_upper {
        return Err(MemeCoreError::InvalidPrice);
    }

    if sqrt_price <= sqrt_price_lower {
        let a0 = amount0_delta(liquidity, sqrt_price_lower, sqrt_price_upper, round_up)?;
        return Ok((a0, 0));
    }
    if sqrt_price >= sqrt_price_upper {
        let a1 = amount1_delta(liquidity, sqrt_price_lower, sqrt_price_upper, round_up)?;
        return Ok((0, a1));
    }
    let a0 = amount0_delta(liquidity, sqrt_price, sqrt_price_upper, round_up)?;
    let a1 = amount1_delta(liquidity, sqrt_price_lower, sqrt_price, round_up)?;
    Ok((a0, a1))
}

/// Token 0 delta between two sqrt prices
pub fn amount0_delta(
    liquidity: u128,
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    round_up: bool,
) -> CoreResult<u64> {
    try_get_amount_delta_a(
        U128::from(sqrt_price_a.min(sqrt_price_b)),
        U128::from(sqrt_price_a.max(sqrt_price_b)),
        U128::from(liquidity),
        round_up,
    )
    .map_err(|_| MemeCoreError::MathOverflow)
}

/// Token 1 delta between two sqrt prices
pub fn amount1_delta(
    liquidity: u128,
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    round_up: bool,
) -> CoreResult<u64> {
    try_get_amount_delta_b(
        U128::from(sqrt_price_a.min(sqrt_price_b)),
        U128::from(sqrt_price_a.max(sqrt_price_b)),
        U128::from(liquidity),
        round_up,
    )
    .map_err(|_| MemeCoreError::MathOverflow)
}

fn ordered(a: u128, b: u128) -> CoreResult<(u128, u128)> {
    let (lower, upper) = if a < b { (a, b) } else { (b, a) };
    if lower == upper {
        return Err(MemeCoreError::InvalidPrice);
    }
    Ok((lower, upper))
}
