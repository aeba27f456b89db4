//! # Protocol
//!
//! Transactional facade over the factory, the oracle and the burner. Every
//! entry point runs against a checkpoint of the whole state, host included,
//! and the checkpoint is restored when the entry point fails.

use crate::burner::{BuyBackBurner, Retirement};
use crate::config::ProtocolConfig;
use crate::context::ExecutionContext;
use crate::domain::DomainCapabilities;
use crate::errors::{CoreResult, MemeCoreError};
use crate::events::{EventLog, ProtocolEvent};
use crate::factory::LaunchFactory;
use crate::host::Host;
use crate::oracle::PriceOracle;
use crate::types::{LaunchPhase, LaunchRecord, PriceSnapshot, SettlementLedger};
use anchor_lang::prelude::Pubkey;

/// Mutable state covered by a checkpoint
#[derive(Clone, Debug)]
struct ProtocolState<H> {
    host: H,
    factory: LaunchFactory,
    burner: BuyBackBurner,
    oracle: PriceOracle,
    ledger: SettlementLedger,
    events: EventLog,
}

pub struct Protocol<H: Host, D: DomainCapabilities<H>> {
    state: ProtocolState<H>,
    domain: D,
}

impl<H: Host, D: DomainCapabilities<H>> Protocol<H, D> {
    /// Assemble the protocol. `factory` and `burner` are the custody
    /// accounts of the two components on the host.
    pub fn new(
        host: H,
        domain: D,
        config: ProtocolConfig,
        factory: Pubkey,
        burner: Pubkey,
    ) -> CoreResult<Self> {
        config.validate()?;
        if config.oracle.pool_asset != domain.pool_asset() {
            return Err(MemeCoreError::InvalidParameter(
                "oracle pool asset differs from the domain pool asset",
            ));
        }
        if factory == burner {
            return Err(MemeCoreError::InvalidParameter("factory and burner accounts must differ"));
        }

        let oracle = PriceOracle::new(config.oracle.clone())?;
        Ok(Self {
            state: ProtocolState {
                host,
                factory: LaunchFactory::new(config.factory.clone(), factory, burner),
                burner: BuyBackBurner::new(config.burner.clone(), burner),
                oracle,
                ledger: SettlementLedger::default(),
                events: EventLog::default(),
            },
            domain,
        })
    }

    /// Run `op` against a checkpoint, restoring it on failure
    fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut ProtocolState<H>, &D) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let checkpoint = self.state.clone();
        match op(&mut self.state, &self.domain) {
            Ok(value) => Ok(value),
            Err(err) => {
                log::debug!("rolled back: {}", err);
                self.state = checkpoint;
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Factory
    // ------------------------------------------------------------------------

    pub fn summon(
        &mut self,
        caller: &Pubkey,
        name: &str,
        symbol: &str,
        total_supply: u64,
        deposit: u64,
    ) -> CoreResult<u64> {
        self.atomically(|s, domain| {
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.factory.summon(&mut ctx, caller, name, symbol, total_supply, deposit)
        })
    }

    pub fn heart(&mut self, caller: &Pubkey, launch_id: u64, amount: u64) -> CoreResult<()> {
        self.atomically(|s, domain| {
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.factory.heart(&mut ctx, caller, launch_id, amount)
        })
    }

    pub fn unleash(&mut self, caller: &Pubkey, launch_id: u64) -> CoreResult<()> {
        self.atomically(|s, domain| {
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.factory.unleash(&mut ctx, caller, launch_id)
        })
    }

    pub fn collect(&mut self, caller: &Pubkey, launch_id: u64) -> CoreResult<u64> {
        self.atomically(|s, domain| {
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.factory.collect(&mut ctx, caller, launch_id)
        })
    }

    pub fn purge(&mut self, caller: &Pubkey, launch_id: u64) -> CoreResult<u64> {
        self.atomically(|s, domain| {
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.factory.purge(&mut ctx, caller, launch_id)
        })
    }

    pub fn collect_fees(&mut self, caller: &Pubkey, launch_ids: &[u64]) -> CoreResult<u64> {
        self.atomically(|s, domain| {
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.factory.collect_fees(&mut ctx, caller, launch_ids)
        })
    }

    pub fn schedule_for_retirement(&mut self, caller: &Pubkey) -> CoreResult<u64> {
        self.atomically(|s, domain| {
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.factory.schedule_for_retirement(&mut ctx, caller)
        })
    }

    // ------------------------------------------------------------------------
    // Oracle and settlement
    // ------------------------------------------------------------------------

    pub fn refresh_oracle(&mut self) -> CoreResult<bool> {
        self.atomically(|s, _| s.oracle.refresh(&s.host, &mut s.events))
    }

    pub fn convert(&mut self, caller: &Pubkey, amount: u64) -> CoreResult<u64> {
        self.atomically(|s, domain| {
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.burner.convert(&mut ctx, &s.oracle, caller, amount)
        })
    }

    pub fn retire_and_bridge(
        &mut self,
        caller: &Pubkey,
        gas_limit: u32,
        payload: &[u8],
        attached_fee: u64,
    ) -> CoreResult<Retirement> {
        self.atomically(|s, domain| {
            let target = s.oracle.config().target_asset;
            let mut ctx = ExecutionContext::new(&mut s.host, domain, &mut s.ledger, &mut s.events);
            s.burner
                .retire_and_bridge(&mut ctx, &target, caller, gas_limit, payload, attached_fee)
        })
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    pub fn launch(&self, launch_id: u64) -> Option<&LaunchRecord> {
        self.state.factory.launch(launch_id)
    }

    pub fn launch_count(&self) -> u64 {
        self.state.factory.launch_count()
    }

    pub fn contribution(&self, launch_id: u64, funder: &Pubkey) -> u64 {
        self.state.factory.contribution(launch_id, funder)
    }

    pub fn pending_allocation(&self, launch_id: u64, funder: &Pubkey) -> CoreResult<u64> {
        self.state.factory.pending_allocation(launch_id, funder)
    }

    pub fn phase(&self, launch_id: u64, now: i64) -> CoreResult<LaunchPhase> {
        self.state.factory.phase(launch_id, now)
    }

    pub fn ledger(&self) -> &SettlementLedger {
        &self.state.ledger
    }

    pub fn oracle_snapshot(&self) -> &PriceSnapshot {
        self.state.oracle.snapshot()
    }

    pub fn events(&self) -> &[ProtocolEvent] {
        self.state.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<ProtocolEvent> {
        self.state.events.drain()
    }

    pub fn factory_address(&self) -> Pubkey {
        self.state.factory.address()
    }

    pub fn burner_address(&self) -> Pubkey {
        self.state.burner.address()
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    pub fn host(&self) -> &H {
        &self.state.host
    }

    /// Direct host access for clock control and external market activity
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.state.host
    }
}
