//! Borrowed execution state handed to the factory and the burner

use crate::domain::DomainCapabilities;
use crate::events::EventLog;
use crate::host::Host;
use crate::types::SettlementLedger;

/// Everything an entry point may touch besides its own component
pub struct ExecutionContext<'a, H: Host, D: DomainCapabilities<H>> {
    pub host: &'a mut H,
    pub domain: &'a D,
    pub ledger: &'a mut SettlementLedger,
    pub events: &'a mut EventLog,
}

impl<'a, H: Host, D: DomainCapabilities<H>> ExecutionContext<'a, H, D> {
    pub fn new(
        host: &'a mut H,
        domain: &'a D,
        ledger: &'a mut SettlementLedger,
        events: &'a mut EventLog,
    ) -> Self {
        Self {
            host,
            domain,
            ledger,
            events,
        }
    }

    pub fn now(&self) -> i64 {
        self.host.unix_timestamp()
    }
}
