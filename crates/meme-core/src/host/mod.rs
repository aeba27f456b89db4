//! # Host Interfaces
//!
//! Collaborators the protocol drives but does not implement: the token
//! ledger, the concentrated-liquidity AMM, the cross-domain bridge and the
//! clock. A [`Host`] bundles all four and can be checkpointed by cloning.

pub mod memory;

pub use memory::MemoryHost;

use crate::errors::CoreResult;
use anchor_lang::prelude::Pubkey;

// ============================================================================
// Token Ledger
// ============================================================================

/// Fungible token balances and allowances
pub trait TokenLedger {
    fn balance_of(&self, token: &Pubkey, owner: &Pubkey) -> u64;

    fn allowance(&self, token: &Pubkey, owner: &Pubkey, spender: &Pubkey) -> u64;

    /// Set the allowance of `spender` over `owner`'s balance
    fn approve(
        &mut self,
        token: &Pubkey,
        owner: &Pubkey,
        spender: &Pubkey,
        amount: u64,
    ) -> CoreResult<()>;

    /// Move tokens on behalf of their owner
    fn transfer(
        &mut self,
        token: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> CoreResult<()>;

    /// Move tokens on behalf of an approved spender
    fn transfer_from(
        &mut self,
        token: &Pubkey,
        spender: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> CoreResult<()>;

    /// Destroy tokens held by `owner`
    fn burn(&mut self, token: &Pubkey, owner: &Pubkey, amount: u64) -> CoreResult<()>;

    /// Deploy a token and mint its whole supply to `owner`
    fn create_token(
        &mut self,
        name: &str,
        symbol: &str,
        decimals: u8,
        supply: u64,
        owner: &Pubkey,
    ) -> CoreResult<Pubkey>;

    /// Convert native asset held by `owner` into the wrapped pool asset
    fn wrap_native(&mut self, owner: &Pubkey, amount: u64) -> CoreResult<u64>;
}

// ============================================================================
// Concentrated Liquidity AMM
// ============================================================================

/// Current pool price state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSlot {
    pub token0: Pubkey,
    pub token1: Pubkey,
    /// Q64.64 sqrt price of token 0 in token 1
    pub sqrt_price: u128,
    pub tick: i32,
}

/// Liquidity position request
#[derive(Clone, Copy, Debug)]
pub struct MintPositionParams {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: u64,
    pub amount1_desired: u64,
    pub amount0_min: u64,
    pub amount1_min: u64,
}

/// Position created by the AMM
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintedPosition {
    pub position_id: u64,
    pub liquidity: u128,
    pub amount0: u64,
    pub amount1: u64,
}

/// Exact-input swap request. The AMM pulls `amount_in` from `payer`
/// through its allowance.
#[derive(Clone, Copy, Debug)]
pub struct SwapParams {
    pub token_in: Pubkey,
    pub token_out: Pubkey,
    pub fee_bps: u16,
    pub payer: Pubkey,
    pub recipient: Pubkey,
    pub amount_in: u64,
    pub amount_out_minimum: u64,
}

/// External concentrated-liquidity AMM
pub trait ConcentratedAmm {
    /// Address the AMM spends allowances as
    fn address(&self) -> Pubkey;

    fn get_pool(&self, token_a: &Pubkey, token_b: &Pubkey, fee_bps: u16) -> Option<Pubkey>;

    /// Return the pool for an ordered pair, creating it at `sqrt_price` when absent
    fn create_and_initialize_pool_if_necessary(
        &mut self,
        token0: &Pubkey,
        token1: &Pubkey,
        fee_bps: u16,
        sqrt_price: u128,
    ) -> CoreResult<Pubkey>;

    fn tick_spacing(&self, fee_bps: u16) -> CoreResult<u16>;

    fn mint_position(&mut self, params: MintPositionParams) -> CoreResult<MintedPosition>;

    /// Pay every fee owed to a position to its owner
    fn collect(
        &mut self,
        pool: &Pubkey,
        position_id: u64,
        owner: &Pubkey,
    ) -> CoreResult<(u64, u64)>;

    fn slot0(&self, pool: &Pubkey) -> CoreResult<PoolSlot>;

    /// Tick cumulatives at each `now - seconds_ago`
    fn observe(&self, pool: &Pubkey, seconds_agos: &[u32]) -> CoreResult<Vec<i64>>;

    /// Returns the output amount
    fn swap_exact_input(&mut self, params: SwapParams) -> CoreResult<u64>;
}

// ============================================================================
// Cross-Domain Bridge
// ============================================================================

pub trait CrossDomainBridge {
    /// Native fee charged for a remote transfer
    fn quote_fee(&self, gas_limit: u32, payload: &[u8]) -> u64;

    /// Move `amount` of `token` from `sender` to `remote_recipient` in the
    /// remote domain. The fee is paid in native asset by `sender`.
    #[allow(clippy::too_many_arguments)]
    fn transfer_to_remote(
        &mut self,
        sender: &Pubkey,
        token: &Pubkey,
        amount: u64,
        remote_recipient: &Pubkey,
        gas_limit: u32,
        payload: &[u8],
        fee: u64,
    ) -> CoreResult<()>;
}

// ============================================================================
// Clock
// ============================================================================

pub trait Clock {
    fn unix_timestamp(&self) -> i64;
}

/// Everything the protocol needs from its execution environment
pub trait Host: TokenLedger + ConcentratedAmm + CrossDomainBridge + Clock + Clone {}

impl<T> Host for T where T: TokenLedger + ConcentratedAmm + CrossDomainBridge + Clock + Clone {}
