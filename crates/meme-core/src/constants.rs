//! # Protocol Constants
//!
//! Fixed protocol parameters:
//! - Fixed-point scales (Q64, price scale)
//! - Launch lifecycle delays and allocation percentages
//! - Token supply bounds
//! - Pool fee tier and tick range
//! - Price sanity thresholds

use anchor_lang::prelude::Pubkey;

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Q64 fixed-point scale factor: 2^64
pub const Q64: u128 = 1u128 << 64;

/// Fixed-point scale for prices and ratios (1e18)
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Square root of `PRICE_SCALE`, removed after taking the root of a scaled ratio
pub const SQRT_PRICE_SCALE: u128 = 1_000_000_000;

/// Percentage denominator
pub const PERCENT_DENOMINATOR: u64 = 100;

/// Upper bound on Newton iterations for the 256-bit integer square root
pub const MAX_NEWTON_ITERATIONS: u32 = 32;

// ============================================================================
// Launch Lifecycle
// ============================================================================

/// Delay between summon and the first moment a launch can be unleashed (24h)
pub const UNLEASH_DELAY: i64 = 24 * 60 * 60;

/// Window after unleash during which funders may collect (24h)
pub const COLLECT_DELAY: i64 = 24 * 60 * 60;

/// Share of the funding total scheduled for retirement at unleash
pub const BURN_PERCENTAGE: u64 = 10;

/// Share of the minted supply deposited into the pool at unleash
pub const LP_PERCENTAGE: u64 = 50;

// ============================================================================
// Token Parameters
// ============================================================================

/// Decimals of every launched token
pub const MEME_TOKEN_DECIMALS: u8 = 9;

/// Minimum supply of a launched token: 1M whole tokens
pub const MIN_TOTAL_SUPPLY: u64 = 1_000_000 * 10u64.pow(MEME_TOKEN_DECIMALS as u32);

/// Exclusive upper bound on the supply, keeps pool deposits inside u64
pub const MAX_TOTAL_SUPPLY: u64 = u64::MAX;

/// Maximum token name length in bytes
pub const MAX_NAME_LENGTH: usize = 32;

/// Maximum token symbol length in bytes
pub const MAX_SYMBOL_LENGTH: usize = 10;

// ============================================================================
// Pool Parameters
// ============================================================================

/// Fee tier of launch pools in basis points (1%)
pub const LAUNCH_POOL_FEE_BPS: u16 = 100;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Minimum tick index supported by the pool
pub const MIN_TICK_INDEX: i32 = -443_636;

/// Maximum tick index supported by the pool
pub const MAX_TICK_INDEX: i32 = 443_636;

/// Minimum sqrt price in Q64.64 format (price at `MIN_TICK_INDEX`)
pub const MIN_SQRT_PRICE_X64: u128 = 4_295_048_016;

/// Maximum sqrt price in Q64.64 format (price at `MAX_TICK_INDEX`)
pub const MAX_SQRT_PRICE_X64: u128 = 79_226_673_515_401_279_992_447_579_055;

// ============================================================================
// Price Sanity
// ============================================================================

/// Lookback used to average pool ticks before harvesting fees (30 minutes)
pub const OBSERVATION_WINDOW_SECS: u32 = 30 * 60;

/// Maximum spot vs. time-weighted deviation, scaled by `PRICE_SCALE` (1%)
pub const MAX_ALLOWED_DEVIATION: u128 = PRICE_SCALE / 100;

/// Maximum oracle slippage in percent
pub const MAX_SLIPPAGE_PERCENT: u8 = 100;

// ============================================================================
// Retirement
// ============================================================================

/// Remote address that receives retired target tokens. Nothing holds its key.
pub const RETIREMENT_ADDRESS: Pubkey = Pubkey::new_from_array([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xde, 0xad,
]);

/// Default gas limit forwarded to the bridge for the remote leg
pub const DEFAULT_BRIDGE_GAS_LIMIT: u32 = 300_000;
