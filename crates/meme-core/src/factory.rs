//! # Launch Factory
//!
//! Phase-gated launch state machine:
//!
//! 1. `summon` creates a launch funded by the caller's deposit
//! 2. `heart` adds contributions until the launch is unleashed
//! 3. `unleash` mints the token, seeds a full-range pool and fixes the
//!    funder allocation
//! 4. `collect` pays each funder pro rata during the collect window
//! 5. `purge` burns whatever was not collected once the window closes
//!
//! Fee harvesting and retirement scheduling feed the settlement ledger.

use crate::config::FactoryConfig;
use crate::constants::{
    BURN_PERCENTAGE, LP_PERCENTAGE, MAX_NAME_LENGTH, MAX_SYMBOL_LENGTH, MAX_TOTAL_SUPPLY,
    MEME_TOKEN_DECIMALS, MIN_TOTAL_SUPPLY,
};
use crate::context::ExecutionContext;
use crate::domain::DomainCapabilities;
use crate::errors::{CoreResult, MemeCoreError};
use crate::events::ProtocolEvent;
use crate::host::Host;
use crate::math::safe_math::{safe_add_u64, safe_mul_div_u64, safe_percentage, safe_sub_u64};
use crate::pool_adapter::LiquidityPoolAdapter;
use crate::reentrancy::{ReentrancyGuard, ReentrancyStatus};
use crate::types::{LaunchPhase, LaunchRecord};
use anchor_lang::prelude::Pubkey;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct LaunchFactory {
    config: FactoryConfig,
    /// Custody account of deposits and minted supply
    address: Pubkey,
    /// Settlement engine receiving scheduled retirements
    burner: Pubkey,
    adapter: LiquidityPoolAdapter,
    next_launch_id: u64,
    launches: BTreeMap<u64, LaunchRecord>,
    contributions: BTreeMap<(u64, Pubkey), u64>,
    status: ReentrancyStatus,
}

impl LaunchFactory {
    pub fn new(config: FactoryConfig, address: Pubkey, burner: Pubkey) -> Self {
        let adapter = LiquidityPoolAdapter::new(config.pool_fee_bps);
        Self {
            config,
            address,
            burner,
            adapter,
            next_launch_id: 1,
            launches: BTreeMap::new(),
            contributions: BTreeMap::new(),
            status: ReentrancyStatus::Unlocked,
        }
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn is_locked(&self) -> bool {
        ReentrancyGuard::is_locked(&self.status)
    }

    /// Run `op` under the factory's reentrancy guard
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> CoreResult<T>) -> CoreResult<T> {
        ReentrancyGuard::acquire(&mut self.status)?;
        let result = op(self);
        ReentrancyGuard::release(&mut self.status);
        result
    }

    // ------------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------------

    /// Create a launch funded by `deposit`. Returns the launch id.
    pub fn summon<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        name: &str,
        symbol: &str,
        total_supply: u64,
        deposit: u64,
    ) -> CoreResult<u64> {
        self.guarded(|factory| {
            factory.summon_inner(ctx, caller, name, symbol, total_supply, deposit)
        })
    }

    fn summon_inner<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        name: &str,
        symbol: &str,
        total_supply: u64,
        deposit: u64,
    ) -> CoreResult<u64> {
        if deposit < self.config.min_summon_deposit {
            return Err(MemeCoreError::DepositBelowMinimum {
                deposit,
                minimum: self.config.min_summon_deposit,
            });
        }
        if !(MIN_TOTAL_SUPPLY..MAX_TOTAL_SUPPLY).contains(&total_supply) {
            return Err(MemeCoreError::SupplyOutOfRange(total_supply));
        }
        if name.is_empty() || name.len() > MAX_NAME_LENGTH {
            return Err(MemeCoreError::InvalidName);
        }
        if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LENGTH {
            return Err(MemeCoreError::InvalidSymbol);
        }

        ReentrancyGuard::acquire_for_hooks(&mut self.status)?;
        let verdict = ctx
            .domain
            .launch_campaign_hook(ctx.host, caller, name, symbol, total_supply);
        ReentrancyGuard::exit_hooks(&mut self.status);
        verdict?;

        let native = ctx.domain.native_asset();
        ctx.host.transfer(&native, caller, &self.address, deposit)?;

        let launch_id = self.next_launch_id;
        self.next_launch_id = safe_add_u64(launch_id, 1)?;
        let summoned_at = ctx.now();
        self.launches.insert(
            launch_id,
            LaunchRecord {
                name: name.to_string(),
                symbol: symbol.to_string(),
                total_supply,
                summoner: *caller,
                total_contributed: deposit,
                summoned_at,
                ..Default::default()
            },
        );
        self.contributions.insert((launch_id, *caller), deposit);

        log::debug!("launch {} summoned by {} ({})", launch_id, caller, symbol);
        ctx.events.emit(ProtocolEvent::Summoned {
            launch_id,
            summoner: *caller,
            name: name.to_string(),
            symbol: symbol.to_string(),
            total_supply,
        });
        ctx.events.emit(ProtocolEvent::Hearted {
            launch_id,
            funder: *caller,
            amount: deposit,
        });
        Ok(launch_id)
    }

    /// Add `amount` of native asset to a launch that is not unleashed yet
    pub fn heart<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_id: u64,
        amount: u64,
    ) -> CoreResult<()> {
        self.guarded(|factory| factory.heart_inner(ctx, caller, launch_id, amount))
    }

    fn heart_inner<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_id: u64,
        amount: u64,
    ) -> CoreResult<()> {
        if amount == 0 {
            return Err(MemeCoreError::ZeroAmount);
        }
        let record = self.record(launch_id)?;
        if record.is_unleashed() {
            return Err(MemeCoreError::AlreadyUnleashed(launch_id));
        }
        let total_contributed = safe_add_u64(record.total_contributed, amount)?;
        let contribution = safe_add_u64(self.contribution(launch_id, caller), amount)?;

        let native = ctx.domain.native_asset();
        ctx.host.transfer(&native, caller, &self.address, amount)?;

        self.record_mut(launch_id)?.total_contributed = total_contributed;
        self.contributions.insert((launch_id, *caller), contribution);

        ctx.events.emit(ProtocolEvent::Hearted {
            launch_id,
            funder: *caller,
            amount,
        });
        Ok(())
    }

    /// Mint the launch token, seed its pool and settle the caller if they funded it
    pub fn unleash<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_id: u64,
    ) -> CoreResult<()> {
        self.guarded(|factory| factory.unleash_inner(ctx, caller, launch_id))
    }

    fn unleash_inner<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_id: u64,
    ) -> CoreResult<()> {
        let record = self.record(launch_id)?.clone();
        if record.is_unleashed() {
            return Err(MemeCoreError::AlreadyUnleashed(launch_id));
        }
        let now = ctx.now();
        if now < record.unleash_available_at() {
            return Err(MemeCoreError::UnleashTooEarly {
                launch_id,
                available_at: record.unleash_available_at(),
            });
        }

        // The whole contribution becomes pool asset; the retirement share
        // is counted in pool-asset units
        let total = record.total_contributed;
        let wrapped = ctx.domain.wrap_native(ctx.host, &self.address, total)?;
        let retirement = safe_percentage(wrapped, BURN_PERCENTAGE)?;
        let pool_amount = safe_sub_u64(wrapped, retirement)?;

        let token = ctx.host.create_token(
            &record.name,
            &record.symbol,
            MEME_TOKEN_DECIMALS,
            record.total_supply,
            &self.address,
        )?;
        let lp_tokens = safe_percentage(record.total_supply, LP_PERCENTAGE)?;
        let final_holders_share = safe_sub_u64(record.total_supply, lp_tokens)?;

        let pool_asset = ctx.domain.pool_asset();
        let seeded = self.adapter.create_pool_and_mint(
            ctx.host,
            &self.address,
            &token,
            &pool_asset,
            lp_tokens,
            pool_amount,
        )?;

        // Unconsumed pool asset joins the retirement share. Unconsumed
        // launch tokens stay in custody until purge.
        let retirement_amount = safe_add_u64(retirement, seeded.leftover_b)?;
        ctx.ledger.schedule(retirement_amount)?;

        let stored = self.record_mut(launch_id)?;
        stored.unleashed_at = now;
        stored.final_holders_share = final_holders_share;
        stored.token = token;
        stored.pool = seeded.pool;
        stored.position_id = seeded.position_id;
        stored.meme_is_token0 = seeded.a_is_token0;

        log::debug!(
            "launch {} unleashed: token={} pool={} liquidity={} retirement={}",
            launch_id,
            token,
            seeded.pool,
            seeded.liquidity,
            retirement_amount
        );
        ctx.events.emit(ProtocolEvent::Unleashed {
            launch_id,
            token,
            pool: seeded.pool,
            position_id: seeded.position_id,
            liquidity: seeded.liquidity,
            retirement_amount,
            final_holders_share,
            timestamp: now,
        });

        // Auto-collect for a funding caller; dust allocations stay collectable later
        if self.pending_allocation(launch_id, caller)? > 0 {
            self.collect_inner(ctx, caller, launch_id)?;
        }
        Ok(())
    }

    /// Pay the caller's allocation during the collect window
    pub fn collect<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_id: u64,
    ) -> CoreResult<u64> {
        self.guarded(|factory| factory.collect_inner(ctx, caller, launch_id))
    }

    fn collect_inner<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_id: u64,
    ) -> CoreResult<u64> {
        let record = self.record(launch_id)?;
        if !record.is_unleashed() {
            return Err(MemeCoreError::NotUnleashed(launch_id));
        }
        if ctx.now() > record.collect_deadline() {
            return Err(MemeCoreError::CollectWindowClosed(launch_id));
        }
        let contribution = self.contribution(launch_id, caller);
        if contribution == 0 {
            return Err(MemeCoreError::NothingToCollect);
        }
        let allocation =
            safe_mul_div_u64(record.final_holders_share, contribution, record.total_contributed)?;
        if allocation == 0 {
            return Err(MemeCoreError::ZeroAllocation);
        }
        let token = record.token;

        self.contributions.insert((launch_id, *caller), 0);
        ctx.host.transfer(&token, &self.address, caller, allocation)?;

        ctx.events.emit(ProtocolEvent::Collected {
            launch_id,
            funder: *caller,
            allocation,
        });
        Ok(allocation)
    }

    /// Burn the uncollected remainder once the collect window has closed.
    /// Anyone may purge.
    pub fn purge<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_id: u64,
    ) -> CoreResult<u64> {
        self.guarded(|factory| factory.purge_inner(ctx, caller, launch_id))
    }

    fn purge_inner<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_id: u64,
    ) -> CoreResult<u64> {
        let record = self.record(launch_id)?;
        if !record.is_unleashed() {
            return Err(MemeCoreError::NotUnleashed(launch_id));
        }
        if ctx.now() <= record.collect_deadline() {
            return Err(MemeCoreError::CollectWindowOpen(launch_id));
        }
        let token = record.token;
        let remaining = ctx.host.balance_of(&token, &self.address);
        if remaining == 0 {
            return Err(MemeCoreError::NothingToPurge);
        }
        ctx.host.burn(&token, &self.address, remaining)?;

        log::debug!("launch {} purged {} uncollected tokens (by {})", launch_id, remaining, caller);
        ctx.events.emit(ProtocolEvent::Purged {
            launch_id,
            amount: remaining,
        });
        Ok(remaining)
    }

    /// Harvest trading fees of every listed launch
    pub fn collect_fees<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_ids: &[u64],
    ) -> CoreResult<u64> {
        self.guarded(|factory| factory.collect_fees_inner(ctx, caller, launch_ids))
    }

    fn collect_fees_inner<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
        launch_ids: &[u64],
    ) -> CoreResult<u64> {
        if launch_ids.is_empty() {
            return Err(MemeCoreError::EmptyLaunchList);
        }
        let pool_asset = ctx.domain.pool_asset();
        let mut total = 0u64;
        for &launch_id in launch_ids {
            let record = self.record(launch_id)?;
            if !record.is_unleashed() {
                return Err(MemeCoreError::NotUnleashed(launch_id));
            }
            let harvested = self.adapter.harvest_fees(
                ctx.host,
                &self.address,
                &record.pool,
                record.position_id,
                &record.token,
                &pool_asset,
            )?;
            ctx.ledger.schedule(harvested.pool_asset_amount)?;
            total = safe_add_u64(total, harvested.pool_asset_amount)?;

            ctx.events.emit(ProtocolEvent::FeesCollected {
                launch_id,
                pool_asset_amount: harvested.pool_asset_amount,
                meme_burned: harvested.meme_burned,
            });
        }
        log::debug!("{} harvested {} pool asset from {} launches", caller, total, launch_ids.len());
        Ok(total)
    }

    /// Hand the scheduled pool asset to the burner
    pub fn schedule_for_retirement<H: Host, D: DomainCapabilities<H>>(
        &mut self,
        ctx: &mut ExecutionContext<'_, H, D>,
        caller: &Pubkey,
    ) -> CoreResult<u64> {
        self.guarded(|factory| {
            let amount = ctx.ledger.scheduled_for_retirement;
            if amount == 0 {
                return Err(MemeCoreError::NothingScheduled);
            }
            let pool_asset = ctx.domain.pool_asset();
            ctx.host.transfer(&pool_asset, &factory.address, &factory.burner, amount)?;
            ctx.ledger.drain_scheduled();
            log::debug!("{} scheduled {} pool asset for retirement", caller, amount);

            ctx.events.emit(ProtocolEvent::RetirementScheduled { amount });
            Ok(amount)
        })
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    pub fn launch(&self, launch_id: u64) -> Option<&LaunchRecord> {
        self.launches.get(&launch_id)
    }

    pub fn launch_count(&self) -> u64 {
        self.next_launch_id - 1
    }

    pub fn contribution(&self, launch_id: u64, funder: &Pubkey) -> u64 {
        self.contributions
            .get(&(launch_id, *funder))
            .copied()
            .unwrap_or(0)
    }

    pub fn phase(&self, launch_id: u64, now: i64) -> CoreResult<LaunchPhase> {
        Ok(self.record(launch_id)?.phase(now))
    }

    /// Allocation the funder would receive by collecting. Before unleash this
    /// is the projection at the current total.
    pub fn pending_allocation(&self, launch_id: u64, funder: &Pubkey) -> CoreResult<u64> {
        let record = self.record(launch_id)?;
        let contribution = self.contribution(launch_id, funder);
        if contribution == 0 {
            return Ok(0);
        }
        let holders_share = if record.is_unleashed() {
            record.final_holders_share
        } else {
            safe_sub_u64(record.total_supply, safe_percentage(record.total_supply, LP_PERCENTAGE)?)?
        };
        safe_mul_div_u64(holders_share, contribution, record.total_contributed)
    }

    fn record(&self, launch_id: u64) -> CoreResult<&LaunchRecord> {
        self.launches
            .get(&launch_id)
            .ok_or(MemeCoreError::LaunchNotFound(launch_id))
    }

    fn record_mut(&mut self, launch_id: u64) -> CoreResult<&mut LaunchRecord> {
        self.launches
            .get_mut(&launch_id)
            .ok_or(MemeCoreError::LaunchNotFound(launch_id))
    }
}
