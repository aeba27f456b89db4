//! # Safe Math Operations
//!
//! Overflow-checked arithmetic used by the factory, pool adapter and burner.

use crate::constants::PERCENT_DENOMINATOR;
use crate::errors::{CoreResult, MemeCoreError};
use ethnum::U256;

/// Macro to generate safe arithmetic functions
///
/// Keyword arms must precede the generic arm.
macro_rules! safe_arith {
    // Narrowing casts with only max check
    (cast_max, $fn_name:ident, $from_type:ty, $to_type:ty) => {
        /// Checked narrowing cast
        pub fn $fn_name(value: $from_type) -> CoreResult<$to_type> {
            <$to_type>::try_from(value).map_err(|_| MemeCoreError::MathOverflow)
        }
    };

    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        /// Checked binary operation
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

safe_arith!(safe_add_u64, u64, checked_add, MemeCoreError::MathOverflow);
safe_arith!(safe_sub_u64, u64, checked_sub, MemeCoreError::MathUnderflow);

safe_arith!(safe_add_u128, u128, checked_add, MemeCoreError::MathOverflow);
safe_arith!(safe_mul_u128, u128, checked_mul, MemeCoreError::MathOverflow);

safe_arith!(cast_max, safe_cast_u128_to_u64, u128, u64);

/// Cast a 256-bit intermediate back into u128
pub fn safe_cast_u256_to_u128(value: U256) -> CoreResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(MemeCoreError::MathOverflow);
    }
    Ok(value.as_u128())
}

/// `a * b / c` with a 256-bit intermediate, rounding down
pub fn safe_mul_div_u128(a: u128, b: u128, c: u128) -> CoreResult<u128> {
    if c == 0 {
        return Err(MemeCoreError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    safe_cast_u256_to_u128(product / U256::from(c))
}

/// `a * b / c` for token amounts, rounding down
pub fn safe_mul_div_u64(a: u64, b: u64, c: u64) -> CoreResult<u64> {
    let result = safe_mul_div_u128(a as u128, b as u128, c as u128)?;
    safe_cast_u128_to_u64(result)
}

/// Percentage share of an amount, rounding down
pub fn safe_percentage(amount: u64, percent: u64) -> CoreResult<u64> {
    if percent > PERCENT_DENOMINATOR {
        return Err(MemeCoreError::InvalidParameter("percentage above 100"));
    }
    safe_mul_div_u64(amount, percent, PERCENT_DENOMINATOR)
}
