//! # Sqrt Price Math
//!
//! Conversions between deposit ratios, Q64.64 sqrt prices and 1e18-scaled
//! prices. Every intermediate runs in 256 bits.

use crate::constants::{
    MAX_NEWTON_ITERATIONS, MAX_SQRT_PRICE_X64, MAX_TICK_INDEX, MIN_SQRT_PRICE_X64,
    MIN_TICK_INDEX, PRICE_SCALE, Q64, SQRT_PRICE_SCALE,
};
use crate::errors::{CoreResult, MemeCoreError};
use crate::math::safe_math::safe_cast_u256_to_u128;
use ethnum::U256;
use orca_whirlpools_core::tick_index_to_sqrt_price;

/// Integer square root by Newton iteration, bounded by `MAX_NEWTON_ITERATIONS`
pub fn isqrt_u256(n: U256) -> CoreResult<U256> {
    if n < U256::from(2u8) {
        return Ok(n);
    }

    // Start from a power of two at or above the root so the sequence decreases
    let bits = 256 - n.leading_zeros();
    let mut x = U256::ONE << ((bits + 1) / 2);
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let y = (x + n / x) >> 1;
        if y >= x {
            return Ok(x);
        }
        x = y;
    }
    Err(MemeCoreError::MathOverflow)
}

/// Initial Q64.64 sqrt price for a pool seeded with `amount_a` of token 0
/// and `amount_b` of token 1.
///
/// `ratio = amount_b * 1e18 / amount_a`, then `isqrt(ratio) * 2^64 / 1e9`.
/// The result must lie inside the pool's representable range.
pub fn compute_initial_price(amount_a: u64, amount_b: u64) -> CoreResult<u128> {
    if amount_a == 0 || amount_b == 0 {
        return Err(MemeCoreError::ZeroAmount);
    }

    let ratio = U256::from(amount_b) * U256::from(PRICE_SCALE) / U256::from(amount_a);
    let root = isqrt_u256(ratio)?;
    let sqrt_price = safe_cast_u256_to_u128(root * U256::from(Q64) / U256::from(SQRT_PRICE_SCALE))?;

    if !(MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price) {
        return Err(MemeCoreError::InvalidPrice);
    }
    Ok(sqrt_price)
}

/// Price of token 0 in token 1, scaled by 1e18
pub fn price_from_sqrt_price(sqrt_price_x64: u128) -> CoreResult<u128> {
    let squared = U256::from(sqrt_price_x64) * U256::from(sqrt_price_x64);
    safe_cast_u256_to_u128(squared * U256::from(PRICE_SCALE) >> 128)
}

/// Price of token 1 in token 0, scaled by 1e18
pub fn inverse_price_from_sqrt_price(sqrt_price_x64: u128) -> CoreResult<u128> {
    if sqrt_price_x64 == 0 {
        return Err(MemeCoreError::DivisionByZero);
    }
    let squared = U256::from(sqrt_price_x64) * U256::from(sqrt_price_x64);
    safe_cast_u256_to_u128((U256::from(PRICE_SCALE) << 128) / squared)
}

/// Q64.64 sqrt price at a tick
pub fn sqrt_price_at_tick(tick: i32) -> CoreResult<u128> {
    if !(MIN_TICK_INDEX..=MAX_TICK_INDEX).contains(&tick) {
        return Err(MemeCoreError::TickOutOfRange);
    }
    Ok(tick_index_to_sqrt_price(tick).into())
}

/// Greatest tick whose sqrt price does not exceed `sqrt_price`
pub fn tick_at_sqrt_price(sqrt_price: u128) -> CoreResult<i32> {
    if !(MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price) {
        return Err(MemeCoreError::InvalidPrice);
    }

    let (mut low, mut high) = (MIN_TICK_INDEX, MAX_TICK_INDEX);
    while low < high {
        // Upper midpoint so `low = mid` always makes progress
        let mid = low + (high - low + 1) / 2;
        if sqrt_price_at_tick(mid)? <= sqrt_price {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Ok(low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt_exact_and_floor() {
        assert_eq!(isqrt_u256(U256::ZERO).unwrap(), U256::ZERO);
        assert_eq!(isqrt_u256(U256::ONE).unwrap(), U256::ONE);
        assert_eq!(isqrt_u256(U256::from(15u8)).unwrap(), U256::from(3u8));
        assert_eq!(isqrt_u256(U256::from(16u8)).unwrap(), U256::from(4u8));
        assert_eq!(isqrt_u256(U256::MAX).unwrap(), U256::from(u128::MAX));
    }

    #[test]
    fn test_equal_amounts_give_unit_price() {
        assert_eq!(compute_initial_price(1_000, 1_000).unwrap(), Q64);
    }

    #[test]
    fn test_quadruple_ratio_doubles_sqrt_price() {
        assert_eq!(compute_initial_price(1_000, 4_000).unwrap(), 2 * Q64);
        assert_eq!(compute_initial_price(4_000, 1_000).unwrap(), Q64 / 2);
    }

    #[test]
    fn test_rejects_zero_and_out_of_range() {
        assert_eq!(compute_initial_price(0, 1), Err(MemeCoreError::ZeroAmount));
        assert_eq!(compute_initial_price(1, 0), Err(MemeCoreError::ZeroAmount));
        // Ratio floors to zero
        assert_eq!(
            compute_initial_price(u64::MAX, 1),
            Err(MemeCoreError::InvalidPrice)
        );
    }

    #[test]
    fn test_tick_lookup_inverts_tick_math() {
        for tick in [-443_636, -120_000, -1, 0, 1, 64, 99_999, 443_636] {
            let sqrt_price = sqrt_price_at_tick(tick).unwrap();
            assert_eq!(tick_at_sqrt_price(sqrt_price).unwrap(), tick);
            if tick < MAX_TICK_INDEX {
                assert_eq!(tick_at_sqrt_price(sqrt_price + 1).unwrap(), tick);
            }
        }
        assert_eq!(tick_at_sqrt_price(Q64).unwrap(), 0);
        assert!(sqrt_price_at_tick(MAX_TICK_INDEX + 1).is_err());
    }

    #[test]
    fn test_price_conversions() {
        assert_eq!(price_from_sqrt_price(Q64).unwrap(), PRICE_SCALE);
        assert_eq!(price_from_sqrt_price(2 * Q64).unwrap(), 4 * PRICE_SCALE);
        assert_eq!(inverse_price_from_sqrt_price(2 * Q64).unwrap(), PRICE_SCALE / 4);
    }
}
