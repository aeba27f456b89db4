//! Shared harness for integration tests

#![allow(dead_code)]

use anchor_lang::prelude::Pubkey;
use meme_core::host::{ConcentratedAmm, MintPositionParams, SwapParams, TokenLedger};
use meme_core::pool_adapter::full_range_ticks;
use meme_core::{
    DomainCapabilities, LocalDomain, MemoryHost, Protocol, ProtocolConfig, WrappedNativeDomain, Q64,
};

/// One whole native token
pub const UNIT: u64 = 1_000_000_000;

/// Supply used by test launches
pub const SUPPLY: u64 = 1_000_000_000 * UNIT;

/// Fee tier of the oracle pool
pub const ORACLE_FEE_BPS: u16 = 100;

pub struct Accounts {
    pub alice: Pubkey,
    pub bob: Pubkey,
    pub carol: Pubkey,
    pub market_maker: Pubkey,
    /// Caller of the permissionless maintenance entry points
    pub keeper: Pubkey,
    pub factory: Pubkey,
    pub burner: Pubkey,
}

pub struct HarnessOptions {
    /// Per-side depth of the pool-asset/target pool read by the oracle
    pub oracle_depth: u64,
    pub config: ProtocolConfig,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        let mut config = ProtocolConfig::default();
        config.factory.min_summon_deposit = UNIT;
        Self {
            oracle_depth: 1_000_000 * UNIT,
            config,
        }
    }
}

pub struct Harness<D: DomainCapabilities<MemoryHost>> {
    pub protocol: Protocol<MemoryHost, D>,
    pub accounts: Accounts,
    pub native: Pubkey,
    pub pool_asset: Pubkey,
    pub target: Pubkey,
}

pub fn wrapped_harness() -> Harness<WrappedNativeDomain> {
    wrapped_harness_with(HarnessOptions::default())
}

pub fn wrapped_harness_with(options: HarnessOptions) -> Harness<WrappedNativeDomain> {
    build(options, |host| WrappedNativeDomain {
        native_mint: host.native_mint(),
        wrapped_mint: host.wrapped_native_mint(),
    })
}

pub fn local_harness() -> Harness<LocalDomain> {
    build(HarnessOptions::default(), |host| LocalDomain {
        native_mint: host.native_mint(),
    })
}

/// Host with funded accounts, a target token and a seeded oracle pool
pub fn build<D: DomainCapabilities<MemoryHost>>(
    options: HarnessOptions,
    make_domain: impl FnOnce(&MemoryHost) -> D,
) -> Harness<D> {
    let mut host = MemoryHost::new();
    let accounts = Accounts {
        alice: host.new_address("alice"),
        bob: host.new_address("bob"),
        carol: host.new_address("carol"),
        market_maker: host.new_address("market-maker"),
        keeper: host.new_address("keeper"),
        factory: host.new_address("factory"),
        burner: host.new_address("burner"),
    };
    let domain = make_domain(&host);
    let native = domain.native_asset();
    let pool_asset = domain.pool_asset();

    for funder in [accounts.alice, accounts.bob, accounts.carol] {
        host.mint_to(&native, &funder, 1_000 * UNIT).unwrap();
    }

    let depth = options.oracle_depth;
    let mm = accounts.market_maker;
    let target = host.create_token("Target", "TGT", 9, depth, &mm).unwrap();
    host.mint_to(&pool_asset, &mm, depth).unwrap();
    let (token0, token1) = if pool_asset < target {
        (pool_asset, target)
    } else {
        (target, pool_asset)
    };
    let pool = host
        .create_and_initialize_pool_if_necessary(&token0, &token1, ORACLE_FEE_BPS, Q64)
        .unwrap();
    let amm = host.address();
    host.approve(&token0, &mm, &amm, depth).unwrap();
    host.approve(&token1, &mm, &amm, depth).unwrap();
    let (tick_lower, tick_upper) =
        full_range_ticks(host.tick_spacing(ORACLE_FEE_BPS).unwrap()).unwrap();
    host.mint_position(MintPositionParams {
        pool,
        owner: mm,
        tick_lower,
        tick_upper,
        amount0_desired: depth,
        amount1_desired: depth,
        amount0_min: 0,
        amount1_min: 0,
    })
    .unwrap();

    let config = options.config.with_assets(pool_asset, target);
    let protocol = Protocol::new(host, domain, config, accounts.factory, accounts.burner).unwrap();
    Harness {
        protocol,
        accounts,
        native,
        pool_asset,
        target,
    }
}

impl<D: DomainCapabilities<MemoryHost>> Harness<D> {
    pub fn now(&self) -> i64 {
        use meme_core::host::Clock;
        self.protocol.host().unix_timestamp()
    }

    pub fn set_time(&mut self, now: i64) {
        self.protocol.host_mut().set_time(now);
    }

    pub fn advance(&mut self, seconds: i64) {
        self.protocol.host_mut().advance(seconds);
    }

    pub fn balance(&self, token: &Pubkey, owner: &Pubkey) -> u64 {
        self.protocol.host().balance_of(token, owner)
    }

    pub fn supply(&self, token: &Pubkey) -> u64 {
        self.protocol.host().total_supply(token)
    }

    /// Alice summons with 100, Bob and Carol heart 50 each
    pub fn funded_launch(&mut self) -> u64 {
        let (alice, bob, carol) = (self.accounts.alice, self.accounts.bob, self.accounts.carol);
        let id = self
            .protocol
            .summon(&alice, "Doge Moon", "DOGEM", SUPPLY, 100 * UNIT)
            .unwrap();
        self.protocol.heart(&bob, id, 50 * UNIT).unwrap();
        self.protocol.heart(&carol, id, 50 * UNIT).unwrap();
        id
    }

    /// Move the clock to the unleash boundary and unleash as `caller`
    pub fn unleash_as(&mut self, caller: Pubkey, id: u64) {
        let available_at = self.protocol.launch(id).unwrap().unleash_available_at();
        if self.now() < available_at {
            self.set_time(available_at);
        }
        self.protocol.unleash(&caller, id).unwrap();
    }

    /// Mint `amount` of `token_in` to the market maker and swap it through
    /// the given pool fee tier
    pub fn market_swap(
        &mut self,
        token_in: Pubkey,
        token_out: Pubkey,
        fee_bps: u16,
        amount: u64,
    ) -> u64 {
        let mm = self.accounts.market_maker;
        let host = self.protocol.host_mut();
        let amm = host.address();
        host.mint_to(&token_in, &mm, amount).unwrap();
        host.approve(&token_in, &mm, &amm, amount).unwrap();
        host.swap_exact_input(SwapParams {
            token_in,
            token_out,
            fee_bps,
            payer: mm,
            recipient: mm,
            amount_in: amount,
            amount_out_minimum: 0,
        })
        .unwrap()
    }

    /// Give the burner pool asset directly
    pub fn fund_burner(&mut self, amount: u64) {
        let (asset, burner) = (self.pool_asset, self.accounts.burner);
        self.protocol.host_mut().mint_to(&asset, &burner, amount).unwrap();
    }
}
