//! Scenario runner
//!
//! Builds an in-memory host with funded accounts and a seeded oracle pool,
//! assembles the protocol on it and plays scenario steps in order. Failed
//! steps roll back inside the protocol and are recorded in the report.

use crate::config::{DomainKind, SimConfig};
use crate::error::{SimError, SimResult};
use crate::scenario::{Scenario, Step, TradeSide};
use anchor_lang::prelude::Pubkey;
use meme_core::host::{Clock, ConcentratedAmm, MintPositionParams, SwapParams, TokenLedger};
use meme_core::pool_adapter::full_range_ticks;
use meme_core::{
    DomainCapabilities, LocalDomain, MemoryHost, Protocol, ProtocolEvent, WrappedNativeDomain, Q64,
};
use std::collections::BTreeMap;

/// Outcome of a scenario run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimReport {
    pub steps_run: usize,
    /// Failed steps as (index, action, error message)
    pub failures: Vec<(usize, &'static str, String)>,
    pub events: Vec<ProtocolEvent>,
    pub scheduled_for_retirement: u64,
    pub pending_bridged_amount: u64,
    pub launches: u64,
}

/// Run `scenario` in the domain selected by `config`
pub fn run(config: &SimConfig, scenario: &Scenario) -> SimResult<SimReport> {
    match config.environment.domain {
        DomainKind::Wrapped => Simulation::new(config, |host| WrappedNativeDomain {
            native_mint: host.native_mint(),
            wrapped_mint: host.wrapped_native_mint(),
        })?
        .play(scenario),
        DomainKind::Local => Simulation::new(config, |host| LocalDomain {
            native_mint: host.native_mint(),
        })?
        .play(scenario),
    }
}

pub struct Simulation<D: DomainCapabilities<MemoryHost>> {
    protocol: Protocol<MemoryHost, D>,
    accounts: BTreeMap<String, Pubkey>,
    /// Trades external flow and calls the maintenance entry points
    market_maker: Pubkey,
    target: Pubkey,
    launch_fee_bps: u16,
    oracle_fee_bps: u16,
    stop_on_error: bool,
}

impl<D: DomainCapabilities<MemoryHost>> Simulation<D> {
    pub fn new(config: &SimConfig, make_domain: impl FnOnce(&MemoryHost) -> D) -> SimResult<Self> {
        config.validate()?;
        let env = &config.environment;

        let mut host = MemoryHost::new();
        host.set_time(env.start_time);
        host.set_bridge_fee(env.bridge_fee);
        let domain = make_domain(&host);
        let native = domain.native_asset();
        let pool_asset = domain.pool_asset();

        let mut accounts = BTreeMap::new();
        for name in &env.accounts {
            let address = host.new_address(name);
            host.mint_to(&native, &address, env.account_balance)?;
            accounts.insert(name.clone(), address);
        }
        let market_maker = host.new_address("market-maker");
        let factory = host.new_address("factory");
        let burner = host.new_address("burner");

        let target = Self::seed_oracle_pool(&mut host, &market_maker, &pool_asset, config)?;
        let protocol_config = config.protocol.clone().with_assets(pool_asset, target);
        let protocol = Protocol::new(host, domain, protocol_config, factory, burner)?;

        log::info!(
            "simulation ready: {} accounts, pool asset {}, target {}",
            accounts.len(),
            pool_asset,
            target
        );
        Ok(Self {
            protocol,
            accounts,
            market_maker,
            target,
            launch_fee_bps: config.protocol.factory.pool_fee_bps,
            oracle_fee_bps: config.protocol.oracle.fee_bps,
            stop_on_error: env.stop_on_error,
        })
    }

    /// Create the target token and a full-range pool of it against the pool
    /// asset at price 1
    fn seed_oracle_pool(
        host: &mut MemoryHost,
        market_maker: &Pubkey,
        pool_asset: &Pubkey,
        config: &SimConfig,
    ) -> SimResult<Pubkey> {
        let depth = config.environment.oracle_depth;
        let fee_bps = config.protocol.oracle.fee_bps;
        let target = host.create_token(
            "Target",
            "TGT",
            meme_core::MEME_TOKEN_DECIMALS,
            depth,
            market_maker,
        )?;
        host.mint_to(pool_asset, market_maker, depth)?;

        let (token0, token1) = if *pool_asset < target {
            (*pool_asset, target)
        } else {
            (target, *pool_asset)
        };
        let pool = host.create_and_initialize_pool_if_necessary(&token0, &token1, fee_bps, Q64)?;
        let amm = host.address();
        host.approve(&token0, market_maker, &amm, depth)?;
        host.approve(&token1, market_maker, &amm, depth)?;
        let (tick_lower, tick_upper) = full_range_ticks(host.tick_spacing(fee_bps)?)?;
        host.mint_position(MintPositionParams {
            pool,
            owner: *market_maker,
            tick_lower,
            tick_upper,
            amount0_desired: depth,
            amount1_desired: depth,
            amount0_min: 0,
            amount1_min: 0,
        })?;
        Ok(target)
    }

    pub fn protocol(&self) -> &Protocol<MemoryHost, D> {
        &self.protocol
    }

    /// Play every step and collect the report
    pub fn play(mut self, scenario: &Scenario) -> SimResult<SimReport> {
        let mut report = SimReport::default();

        for (index, step) in scenario.steps.iter().enumerate() {
            report.steps_run += 1;
            let now = self.protocol.host().unix_timestamp();
            log::debug!("step {} at {}: {:?}", index, now, step);

            match self.execute(step) {
                Ok(()) => {}
                Err(err) if self.stop_on_error => {
                    return Err(SimError::StepFailed {
                        index,
                        action: step.action(),
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    log::warn!("step {} ({}) failed: {}", index, step.action(), err);
                    report.failures.push((index, step.action(), err.to_string()));
                }
            }

            for event in self.protocol.drain_events() {
                log::info!("event: {:?}", event);
                report.events.push(event);
            }
        }

        report.scheduled_for_retirement = self.protocol.ledger().scheduled_for_retirement;
        report.pending_bridged_amount = self.protocol.ledger().pending_bridged_amount;
        report.launches = self.protocol.launch_count();
        Ok(report)
    }

    fn execute(&mut self, step: &Step) -> SimResult<()> {
        match step {
            Step::Summon {
                account,
                name,
                symbol,
                total_supply,
                deposit,
            } => {
                let caller = self.account(account)?;
                let launch_id =
                    self.protocol.summon(&caller, name, symbol, *total_supply, *deposit)?;
                log::info!("{} summoned launch {} ({})", account, launch_id, symbol);
            }
            Step::Heart { account, launch, amount } => {
                let caller = self.account(account)?;
                self.protocol.heart(&caller, *launch, *amount)?;
            }
            Step::Unleash { account, launch } => {
                let caller = self.account(account)?;
                self.protocol.unleash(&caller, *launch)?;
            }
            Step::Collect { account, launch } => {
                let caller = self.account(account)?;
                let allocation = self.protocol.collect(&caller, *launch)?;
                log::info!("{} collected {} from launch {}", account, allocation, launch);
            }
            Step::Purge { launch } => {
                self.protocol.purge(&self.market_maker, *launch)?;
            }
            Step::CollectFees { launches } => {
                let total = self.protocol.collect_fees(&self.market_maker, launches)?;
                log::info!("harvested {} pool asset from {} launches", total, launches.len());
            }
            Step::ScheduleRetirement => {
                self.protocol.schedule_for_retirement(&self.market_maker)?;
            }
            Step::RefreshOracle => {
                if !self.protocol.refresh_oracle()? {
                    log::info!("oracle kept its average");
                }
            }
            Step::Convert { amount } => {
                self.protocol.convert(&self.market_maker, amount.unwrap_or(u64::MAX))?;
            }
            Step::Retire { account, gas_limit, fee } => {
                let caller = self.account(account)?;
                self.protocol.retire_and_bridge(&caller, *gas_limit, &[], *fee)?;
            }
            Step::Trade { launch, side, amount } => {
                self.trade(*launch, *side, *amount)?;
            }
            Step::Advance { seconds } => {
                self.protocol.host_mut().advance(*seconds);
            }
        }
        Ok(())
    }

    /// Market-maker swap through a launch pool or the oracle pool. Input
    /// tokens are minted on the fly.
    fn trade(&mut self, launch: Option<u64>, side: TradeSide, amount: u64) -> SimResult<u64> {
        let pool_asset = self.protocol.domain().pool_asset();
        let (token, fee_bps) = match launch {
            Some(launch_id) => {
                let record = self
                    .protocol
                    .launch(launch_id)
                    .filter(|record| record.is_unleashed())
                    .ok_or(SimError::UnknownLaunch(launch_id))?;
                (record.token, self.launch_fee_bps)
            }
            None => (self.target, self.oracle_fee_bps),
        };
        let (token_in, token_out) = match side {
            TradeSide::Buy => (pool_asset, token),
            TradeSide::Sell => (token, pool_asset),
        };

        let trader = self.market_maker;
        let host = self.protocol.host_mut();
        let amm = host.address();
        host.mint_to(&token_in, &trader, amount)?;
        host.approve(&token_in, &trader, &amm, amount)?;
        let amount_out = host.swap_exact_input(SwapParams {
            token_in,
            token_out,
            fee_bps,
            payer: trader,
            recipient: trader,
            amount_in: amount,
            amount_out_minimum: 0,
        })?;
        log::info!("trade {:?} {} -> {}", side, amount, amount_out);
        Ok(amount_out)
    }

    fn account(&self, name: &str) -> SimResult<Pubkey> {
        self.accounts
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownAccount(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: u64 = 1_000_000_000;

    fn lifecycle() -> Scenario {
        let summon = Step::Summon {
            account: "alice".to_string(),
            name: "Doge Moon".to_string(),
            symbol: "DOGEM".to_string(),
            total_supply: 1_000_000_000 * UNIT,
            deposit: 100 * UNIT,
        };
        let heart = |account: &str| Step::Heart {
            account: account.to_string(),
            launch: 1,
            amount: 50 * UNIT,
        };
        let unleash = Step::Unleash {
            account: "alice".to_string(),
            launch: 1,
        };
        Scenario {
            steps: vec![
                summon,
                heart("bob"),
                heart("carol"),
                Step::Advance { seconds: 86_400 },
                unleash.clone(),
                unleash,
                Step::Collect {
                    account: "bob".to_string(),
                    launch: 1,
                },
                Step::ScheduleRetirement,
                Step::RefreshOracle,
                Step::Advance { seconds: 1 },
                Step::Convert { amount: None },
                Step::Retire {
                    account: "carol".to_string(),
                    gas_limit: 300_000,
                    fee: UNIT,
                },
                Step::Advance { seconds: 86_401 },
                Step::Purge { launch: 1 },
            ],
        }
    }

    #[test]
    fn test_lifecycle_scenario_in_both_domains() {
        for domain in [DomainKind::Wrapped, DomainKind::Local] {
            let mut config = SimConfig::default();
            config.environment.domain = domain;
            let report = run(&config, &lifecycle()).unwrap();

            assert_eq!(report.steps_run, 14);
            assert_eq!(report.launches, 1);
            // Second unleash is the only failure
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].0, 5);
            assert_eq!(report.failures[0].1, "unleash");
            assert_eq!(report.pending_bridged_amount, 0);
            assert!(report
                .events
                .iter()
                .any(|event| matches!(event, ProtocolEvent::Retired { .. })));
            assert!(matches!(report.events.last(), Some(ProtocolEvent::Purged { .. })));
        }
    }

    #[test]
    fn test_stop_on_error() {
        let mut config = SimConfig::default();
        config.environment.stop_on_error = true;
        let scenario = Scenario {
            steps: vec![Step::Purge { launch: 1 }],
        };
        assert!(matches!(
            run(&config, &scenario),
            Err(SimError::StepFailed { index: 0, action: "purge", .. })
        ));
    }

    #[test]
    fn test_unknown_account() {
        let config = SimConfig::default();
        let scenario = Scenario {
            steps: vec![Step::Collect {
                account: "mallory".to_string(),
                launch: 1,
            }],
        };
        let report = run(&config, &scenario).unwrap();
        assert_eq!(report.failures[0].2, "Unknown account: mallory");
    }
}
