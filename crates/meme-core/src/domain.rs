//! # Execution Domains
//!
//! Per-domain behaviour of the engine: how native deposits become the pool
//! asset, how retired target tokens leave the local domain, and whether a
//! launch campaign accepts a new summon.

use crate::constants::RETIREMENT_ADDRESS;
use crate::errors::{CoreResult, MemeCoreError};
use crate::host::Host;
use anchor_lang::prelude::Pubkey;

/// Capabilities that differ between execution domains
pub trait DomainCapabilities<H: Host> {
    /// Asset funders deposit
    fn native_asset(&self) -> Pubkey;

    /// Asset launch pools are paired with
    fn pool_asset(&self) -> Pubkey;

    /// Turn `amount` of native asset held by `owner` into pool asset
    fn wrap_native(&self, host: &mut H, owner: &Pubkey, amount: u64) -> CoreResult<u64>;

    /// Irreversibly move `amount` of `token` to the retirement address.
    /// Returns the part of `attached_fee` that was spent.
    #[allow(clippy::too_many_arguments)]
    fn bridge_out(
        &self,
        host: &mut H,
        sender: &Pubkey,
        token: &Pubkey,
        amount: u64,
        gas_limit: u32,
        payload: &[u8],
        attached_fee: u64,
    ) -> CoreResult<u64>;

    /// Veto point consulted by `summon`
    fn launch_campaign_hook(
        &self,
        _host: &H,
        _summoner: &Pubkey,
        _name: &str,
        _symbol: &str,
        _total_supply: u64,
    ) -> CoreResult<()> {
        Ok(())
    }
}

/// Native deposits are wrapped into a distinct pool asset and retirement
/// crosses the bridge
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrappedNativeDomain {
    pub native_mint: Pubkey,
    pub wrapped_mint: Pubkey,
}

impl<H: Host> DomainCapabilities<H> for WrappedNativeDomain {
    fn native_asset(&self) -> Pubkey {
        self.native_mint
    }

    fn pool_asset(&self) -> Pubkey {
        self.wrapped_mint
    }

    fn wrap_native(&self, host: &mut H, owner: &Pubkey, amount: u64) -> CoreResult<u64> {
        if amount == 0 {
            return Ok(0);
        }
        host.wrap_native(owner, amount)
    }

    fn bridge_out(
        &self,
        host: &mut H,
        sender: &Pubkey,
        token: &Pubkey,
        amount: u64,
        gas_limit: u32,
        payload: &[u8],
        attached_fee: u64,
    ) -> CoreResult<u64> {
        let required = host.quote_fee(gas_limit, payload);
        if attached_fee < required {
            return Err(MemeCoreError::InsufficientBridgeFee {
                attached: attached_fee,
                required,
            });
        }
        host.transfer_to_remote(
            sender,
            token,
            amount,
            &RETIREMENT_ADDRESS,
            gas_limit,
            payload,
            required,
        )?;
        Ok(required)
    }
}

/// The native asset is the pool asset and retirement burns locally
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalDomain {
    pub native_mint: Pubkey,
}

impl<H: Host> DomainCapabilities<H> for LocalDomain {
    fn native_asset(&self) -> Pubkey {
        self.native_mint
    }

    fn pool_asset(&self) -> Pubkey {
        self.native_mint
    }

    fn wrap_native(&self, _host: &mut H, _owner: &Pubkey, amount: u64) -> CoreResult<u64> {
        Ok(amount)
    }

    fn bridge_out(
        &self,
        host: &mut H,
        sender: &Pubkey,
        token: &Pubkey,
        amount: u64,
        _gas_limit: u32,
        _payload: &[u8],
        _attached_fee: u64,
    ) -> CoreResult<u64> {
        host.burn(token, sender, amount)?;
        Ok(0)
    }
}
