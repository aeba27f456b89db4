//! # Buy-Back Burner
//!
//! Settlement engine. Converts the pool asset it holds into the target asset
//! behind oracle checks on both sides of the swap, then retires the target
//! asset through the domain's bridge-out capability.

use crate::config::BurnerConfig;
use crate::constants::{PERCENT_DENOMINATOR, PRICE_SCALE};
use crate::context::ExecutionContext;
use crate::domain::DomainCapabilities;
use crate::errors::{CoreResult, MemeCoreError};
use crate::events::ProtocolEvent;
use crate::host::{Host, SwapParams};
use crate::math::safe_math::{safe_cast_u128_to_u64, safe_mul_div_u128, safe_sub_u64};
use crate::oracle::PriceOracle;
use crate::reentrancy::{ReentrancyGuard, ReentrancyStatus};
use anchor_lang::prelude::Pubkey;

/// Outcome of a retirement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retirement {
    pub amount: u64,
    pub fee_spent: u64,
    pub fee_refunded: u64,
}

#[derive(Clone, Debug)]
pub struct BuyBackBurner {
    config: BurnerConfig,
    /// Account holding the pool asset awaiting conversion
    address: Pubkey,
    status: ReentrancyStatus,
}

impl BuyBackBurner {
    pub fn new(config: BurnerConfig, address: Pubkey) -> Self {
        Self {
            config,
            address,
            status: ReentrancyStatus::Unlocked,
        }
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn config(&self) -> &BurnerConfig {
        &self.config
    }

    pub fn is_locked(&self) -> bool {
        ReentrancyGuard::is_locked(&self.status)
    }

    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> CoreResult<T>) -> CoreResult<T> {
        ReentrancyGuard::acquire(&mut self.status)?;
        let result = op(self);
        ReentrancyGuard::release(&mut self.status);
        result
    }

    /// Minimum swap output for `amount_in` at the oracle average, less slippage
    pub fn minimum_output(&self, oracle: &PriceOracle, amount_in: u64) -> CoreResult<u64> {
        let expected =
            safe_mul_div_u128(amount_in as u128, oracle.snapshot().average_price, PRICE_SCALE)?;
        let kept = (PERCENT_DENOMINATOR - self.config.max_slippage as u64) as u128;
        safe_cast_u128_to_u64(safe_mul_div_u128(expected, kept, PERCENT_DENOMINATOR as u128)?)
    }

    /// Swap up to `amount` of held pool asset into the target asset.
    /// Returns the target amount added to the pending bridge balance.
    pub fn convert<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        oracle: &PriceOracle,
        caller: &Pubkey,
        amount: u64,
    ) -> CoreResult<u64> {
        self.guarded(|burner| burner.convert_inner(ctx, oracle, caller, amount))
    }

    fn convert_inner<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        oracle: &PriceOracle,
        caller: &Pubkey,
        amount: u64,
    ) -> CoreResult<u64> {
        let pool_asset = ctx.domain.pool_asset();
        let target = oracle.config().target_asset;
        let amount_in = amount.min(ctx.host.balance_of(&pool_asset, &self.address));
        if amount_in == 0 {
            return Err(MemeCoreError::ZeroAmount);
        }

        if !oracle.validate(&*ctx.host, self.config.max_slippage)? {
            return Err(MemeCoreError::PriceValidationBeforeSwap);
        }
        let amount_out_minimum = self.minimum_output(oracle, amount_in)?;

        let amm = ctx.host.address();
        ctx.host.approve(&pool_asset, &self.address, &amm, amount_in)?;
        let amount_out = ctx.host.swap_exact_input(SwapParams {
            token_in: pool_asset,
            token_out: target,
            fee_bps: oracle.config().fee_bps,
            payer: self.address,
            recipient: self.address,
            amount_in,
            amount_out_minimum,
        })?;

        if !oracle.validate(&*ctx.host, self.config.max_slippage)? {
            return Err(MemeCoreError::PriceValidationAfterSwap);
        }
        ctx.ledger.add_pending(amount_out)?;

        log::debug!(
            "{} converted {} pool asset into {} target (min {})",
            caller,
            amount_in,
            amount_out,
            amount_out_minimum
        );
        ctx.events.emit(ProtocolEvent::Converted { amount_in, amount_out });
        Ok(amount_out)
    }

    /// Retire the whole pending target balance. `attached_fee` is paid by the
    /// caller in native asset; whatever the bridge does not spend is refunded
    /// on a best-effort basis.
    pub fn retire_and_bridge<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        target: &Pubkey,
        caller: &Pubkey,
        gas_limit: u32,
        payload: &[u8],
        attached_fee: u64,
    ) -> CoreResult<Retirement> {
        self.guarded(|burner| {
            burner.retire_inner(ctx, target, caller, gas_limit, payload, attached_fee)
        })
    }

    fn retire_inner<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        target: &Pubkey,
        caller: &Pubkey,
        gas_limit: u32,
        payload: &[u8],
        attached_fee: u64,
    ) -> CoreResult<Retirement> {
        let pending = ctx.ledger.pending_bridged_amount;
        if pending < self.config.min_bridge_amount {
            return Err(MemeCoreError::BelowBridgeMinimum {
                pending,
                minimum: self.config.min_bridge_amount,
            });
        }

        let native = ctx.domain.native_asset();
        ctx.host.transfer(&native, caller, &self.address, attached_fee)?;
        let fee_spent = ctx
            .domain
            .bridge_out(
                ctx.host,
                &self.address,
                target,
                pending,
                gas_limit,
                payload,
                attached_fee,
            )?;
        ctx.ledger.drain_pending();

        let leftover = safe_sub_u64(attached_fee, fee_spent)?;
        let fee_refunded = if leftover == 0 {
            0
        } else {
            match ctx.host.transfer(&native, &self.address, caller, leftover) {
                Ok(()) => leftover,
                Err(err) => {
                    log::warn!("bridge fee refund of {} to {} failed: {}", leftover, caller, err);
                    0
                }
            }
        };

        ctx.events.emit(ProtocolEvent::Retired {
            amount: pending,
            fee_spent,
            fee_refunded,
        });
        Ok(Retirement {
            amount: pending,
            fee_spent,
            fee_refunded,
        })
    }
}
