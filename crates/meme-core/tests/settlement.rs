//! Fee harvesting, conversion and retirement

mod common;

use common::*;
use meme_core::burner::Retirement;
use meme_core::{MemeCoreError, ProtocolEvent, OBSERVATION_WINDOW_SECS, RETIREMENT_ADDRESS};

const WINDOW: i64 = OBSERVATION_WINDOW_SECS as i64;

/// Oracle initialized one second in the past
fn primed<D: meme_core::DomainCapabilities<meme_core::MemoryHost>>(h: &mut Harness<D>) {
    assert!(h.protocol.refresh_oracle().unwrap());
    h.advance(1);
}

#[test]
fn test_schedule_for_retirement_moves_pool_asset() {
    let mut h = wrapped_harness();
    let (alice, factory, burner) = (h.accounts.alice, h.accounts.factory, h.accounts.burner);
    let id = h.funded_launch();

    assert_eq!(
        h.protocol.schedule_for_retirement(&h.accounts.keeper),
        Err(MemeCoreError::NothingScheduled)
    );

    h.unleash_as(alice, id);
    let scheduled = h.protocol.ledger().scheduled_for_retirement;
    assert_eq!(h.protocol.schedule_for_retirement(&h.accounts.keeper).unwrap(), scheduled);
    assert_eq!(h.balance(&h.pool_asset, &burner), scheduled);
    assert_eq!(h.balance(&h.pool_asset, &factory), 0);
    assert_eq!(h.protocol.ledger().scheduled_for_retirement, 0);
    assert_eq!(
        h.protocol.events().last(),
        Some(&ProtocolEvent::RetirementScheduled { amount: scheduled })
    );

    assert_eq!(
        h.protocol.schedule_for_retirement(&h.accounts.keeper),
        Err(MemeCoreError::NothingScheduled)
    );
}

#[test]
fn test_oracle_refresh_interval() {
    let mut h = wrapped_harness();
    assert!(h.protocol.refresh_oracle().unwrap());
    let first = *h.protocol.oracle_snapshot();
    assert_eq!(first.average_price, 1_000_000_000_000_000_000);
    assert_eq!(first.cumulative_price, 0);

    h.advance(100);
    assert!(!h.protocol.refresh_oracle().unwrap());
    assert_eq!(*h.protocol.oracle_snapshot(), first);

    h.advance(800);
    assert!(h.protocol.refresh_oracle().unwrap());
    let second = *h.protocol.oracle_snapshot();
    assert_eq!(second.cumulative_price, first.average_price * 900);
    assert_eq!(second.tracking_since, first.tracking_since);

    let refreshed = h
        .protocol
        .events()
        .iter()
        .filter(|event| matches!(event, ProtocolEvent::OracleRefreshed { .. }))
        .count();
    assert_eq!(refreshed, 2);
}

#[test]
fn test_convert_requires_initialized_oracle() {
    let mut h = wrapped_harness();
    let burner = h.accounts.burner;
    h.fund_burner(10 * UNIT);

    assert_eq!(
        h.protocol.convert(&h.accounts.keeper, 10 * UNIT),
        Err(MemeCoreError::PriceValidationBeforeSwap)
    );

    // No elapsed time since the first refresh means no average yet
    assert!(h.protocol.refresh_oracle().unwrap());
    assert_eq!(
        h.protocol.convert(&h.accounts.keeper, 10 * UNIT),
        Err(MemeCoreError::PriceValidationBeforeSwap)
    );

    assert_eq!(h.balance(&h.pool_asset, &burner), 10 * UNIT);
    assert_eq!(h.protocol.ledger().pending_bridged_amount, 0);
}

#[test]
fn test_convert_swaps_held_balance() {
    let mut h = wrapped_harness();
    let burner = h.accounts.burner;
    assert_eq!(h.protocol.convert(&h.accounts.keeper, UNIT), Err(MemeCoreError::ZeroAmount));

    h.fund_burner(10 * UNIT);
    primed(&mut h);

    // Requests above the balance are capped
    let out = h.protocol.convert(&h.accounts.keeper, u64::MAX).unwrap();
    assert!(out > 98 * UNIT / 10 && out < 99 * UNIT / 10);
    assert_eq!(h.balance(&h.pool_asset, &burner), 0);
    assert_eq!(h.balance(&h.target, &burner), out);
    assert_eq!(h.protocol.ledger().pending_bridged_amount, out);
    assert_eq!(
        h.protocol.events().last(),
        Some(&ProtocolEvent::Converted { amount_in: 10 * UNIT, amount_out: out })
    );
}

#[test]
fn test_convert_rejects_moved_spot() {
    let mut h = wrapped_harness();
    let burner = h.accounts.burner;
    h.fund_burner(10 * UNIT);
    primed(&mut h);

    let (pool_asset, target) = (h.pool_asset, h.target);
    h.market_swap(pool_asset, target, ORACLE_FEE_BPS, 60_000 * UNIT);

    assert_eq!(
        h.protocol.convert(&h.accounts.keeper, 10 * UNIT),
        Err(MemeCoreError::PriceValidationBeforeSwap)
    );
    assert_eq!(h.balance(&h.pool_asset, &burner), 10 * UNIT);
}

#[test]
fn test_convert_rejects_its_own_price_impact() {
    let mut h = wrapped_harness_with(HarnessOptions {
        oracle_depth: 1_000 * UNIT,
        ..Default::default()
    });
    let burner = h.accounts.burner;
    h.fund_burner(31 * UNIT);
    primed(&mut h);
    let events = h.protocol.events().len();

    assert_eq!(
        h.protocol.convert(&h.accounts.keeper, 31 * UNIT),
        Err(MemeCoreError::PriceValidationAfterSwap)
    );
    assert_eq!(h.balance(&h.pool_asset, &burner), 31 * UNIT);
    assert_eq!(h.balance(&h.target, &burner), 0);
    assert_eq!(h.protocol.ledger().pending_bridged_amount, 0);
    assert_eq!(h.protocol.events().len(), events);
}

#[test]
fn test_retire_below_minimum() {
    let mut h = wrapped_harness();
    let alice = h.accounts.alice;
    assert_eq!(
        h.protocol.retire_and_bridge(&alice, 300_000, &[], 0),
        Err(MemeCoreError::BelowBridgeMinimum { pending: 0, minimum: 1 })
    );
}

#[test]
fn test_retire_bridges_and_refunds() {
    let mut h = wrapped_harness();
    let (alice, burner) = (h.accounts.alice, h.accounts.burner);
    h.fund_burner(10 * UNIT);
    primed(&mut h);
    let pending = h.protocol.convert(&h.accounts.keeper, 10 * UNIT).unwrap();
    h.protocol.host_mut().set_bridge_fee(3);
    let before = h.balance(&h.native, &alice);

    let retirement = h.protocol.retire_and_bridge(&alice, 300_000, b"retire", 10).unwrap();
    assert_eq!(
        retirement,
        Retirement { amount: pending, fee_spent: 3, fee_refunded: 7 }
    );
    assert_eq!(h.balance(&h.native, &alice), before - 3);
    assert_eq!(h.balance(&h.native, &burner), 0);
    assert_eq!(h.balance(&h.target, &burner), 0);
    assert_eq!(h.protocol.ledger().pending_bridged_amount, 0);

    let transfers = h.protocol.host().remote_transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].token, h.target);
    assert_eq!(transfers[0].amount, pending);
    assert_eq!(transfers[0].recipient, RETIREMENT_ADDRESS);
    assert_eq!(transfers[0].payload, b"retire".to_vec());
    assert_eq!(transfers[0].fee, 3);

    assert_eq!(
        h.protocol.events().last(),
        Some(&ProtocolEvent::Retired { amount: pending, fee_spent: 3, fee_refunded: 7 })
    );
}

#[test]
fn test_retire_swallows_failed_refund() {
    let mut h = wrapped_harness();
    let (alice, burner) = (h.accounts.alice, h.accounts.burner);
    h.fund_burner(10 * UNIT);
    primed(&mut h);
    h.protocol.convert(&h.accounts.keeper, 10 * UNIT).unwrap();
    h.protocol.host_mut().set_bridge_fee(3);
    h.protocol.host_mut().refuse_transfers_to(alice);

    let retirement = h.protocol.retire_and_bridge(&alice, 300_000, &[], 10).unwrap();
    assert_eq!(retirement.fee_spent, 3);
    assert_eq!(retirement.fee_refunded, 0);
    assert_eq!(h.balance(&h.native, &burner), 7);
    assert_eq!(h.protocol.ledger().pending_bridged_amount, 0);
}

#[test]
fn test_retire_rolls_back_on_bridge_failure() {
    let mut h = wrapped_harness();
    let (alice, burner) = (h.accounts.alice, h.accounts.burner);
    h.fund_burner(10 * UNIT);
    primed(&mut h);
    let pending = h.protocol.convert(&h.accounts.keeper, 10 * UNIT).unwrap();
    let before = h.balance(&h.native, &alice);

    h.protocol.host_mut().set_bridge_fee(20);
    assert_eq!(
        h.protocol.retire_and_bridge(&alice, 300_000, &[], 10),
        Err(MemeCoreError::InsufficientBridgeFee { attached: 10, required: 20 })
    );

    h.protocol.host_mut().set_bridge_fee(3);
    h.protocol.host_mut().set_bridge_paused(true);
    assert_eq!(
        h.protocol.retire_and_bridge(&alice, 300_000, &[], 10),
        Err(MemeCoreError::BridgeRejected("bridge is paused"))
    );

    assert_eq!(h.balance(&h.native, &alice), before);
    assert_eq!(h.balance(&h.native, &burner), 0);
    assert_eq!(h.balance(&h.target, &burner), pending);
    assert_eq!(h.protocol.ledger().pending_bridged_amount, pending);
    assert!(h.protocol.host().remote_transfers().is_empty());
}

#[test]
fn test_local_retirement_burns_target() {
    let mut h = local_harness();
    let (alice, burner) = (h.accounts.alice, h.accounts.burner);
    h.fund_burner(10 * UNIT);
    primed(&mut h);
    let pending = h.protocol.convert(&h.accounts.keeper, 10 * UNIT).unwrap();
    let supply = h.supply(&h.target);
    let before = h.balance(&h.native, &alice);

    let retirement = h.protocol.retire_and_bridge(&alice, 0, &[], 5).unwrap();
    assert_eq!(retirement, Retirement { amount: pending, fee_spent: 0, fee_refunded: 5 });
    assert_eq!(h.supply(&h.target), supply - pending);
    assert_eq!(h.balance(&h.target, &burner), 0);
    assert_eq!(h.balance(&h.native, &alice), before);
    assert!(h.protocol.host().remote_transfers().is_empty());
}

#[test]
fn test_collect_fees_preconditions() {
    let mut h = wrapped_harness();
    let alice = h.accounts.alice;
    let id = h.funded_launch();

    assert_eq!(
        h.protocol.collect_fees(&h.accounts.keeper, &[]),
        Err(MemeCoreError::EmptyLaunchList)
    );
    assert_eq!(
        h.protocol.collect_fees(&h.accounts.keeper, &[id]),
        Err(MemeCoreError::NotUnleashed(id))
    );
    assert_eq!(
        h.protocol.collect_fees(&h.accounts.keeper, &[id + 1]),
        Err(MemeCoreError::LaunchNotFound(id + 1))
    );

    h.unleash_as(alice, id);
    assert_eq!(
        h.protocol.collect_fees(&h.accounts.keeper, &[id]),
        Err(MemeCoreError::InsufficientObservationHistory)
    );
}

#[test]
fn test_collect_fees_schedules_and_burns() {
    let mut h = wrapped_harness();
    let (alice, factory) = (h.accounts.alice, h.accounts.factory);
    let id = h.funded_launch();
    h.unleash_as(alice, id);
    let record = h.protocol.launch(id).unwrap().clone();
    let scheduled = h.protocol.ledger().scheduled_for_retirement;
    let pool_asset = h.pool_asset;

    // Pool-asset side: 1% of a 1 unit buy
    h.market_swap(pool_asset, record.token, 100, UNIT);
    h.advance(WINDOW);
    assert_eq!(h.protocol.collect_fees(&h.accounts.keeper, &[id]).unwrap(), UNIT / 100);
    assert_eq!(h.protocol.ledger().scheduled_for_retirement, scheduled + UNIT / 100);
    assert_eq!(h.balance(&pool_asset, &factory), scheduled + UNIT / 100);
    assert_eq!(
        h.protocol.events().last(),
        Some(&ProtocolEvent::FeesCollected {
            launch_id: id,
            pool_asset_amount: UNIT / 100,
            meme_burned: 0,
        })
    );

    // Launch-token side is burned
    h.market_swap(record.token, pool_asset, 100, 1_000 * UNIT);
    h.advance(WINDOW);
    let supply = h.supply(&record.token);
    let factory_tokens = h.balance(&record.token, &factory);
    assert_eq!(h.protocol.collect_fees(&h.accounts.keeper, &[id]).unwrap(), 0);
    assert_eq!(h.supply(&record.token), supply - 10 * UNIT);
    assert_eq!(h.balance(&record.token, &factory), factory_tokens);
    assert_eq!(
        h.protocol.events().last(),
        Some(&ProtocolEvent::FeesCollected {
            launch_id: id,
            pool_asset_amount: 0,
            meme_burned: 10 * UNIT,
        })
    );
}

#[test]
fn test_collect_fees_rejects_fresh_manipulation() {
    let mut h = wrapped_harness();
    let alice = h.accounts.alice;
    let id = h.funded_launch();
    h.unleash_as(alice, id);
    let token = h.protocol.launch(id).unwrap().token;
    let pool_asset = h.pool_asset;

    h.advance(WINDOW);
    h.market_swap(pool_asset, token, 100, 20 * UNIT);
    let scheduled = h.protocol.ledger().scheduled_for_retirement;

    assert_eq!(
        h.protocol.collect_fees(&h.accounts.keeper, &[id]),
        Err(MemeCoreError::PriceDeviationTooHigh)
    );
    assert_eq!(h.protocol.ledger().scheduled_for_retirement, scheduled);
}

#[test]
fn test_settlement_pipeline() {
    let mut h = wrapped_harness();
    let (alice, carol) = (h.accounts.alice, h.accounts.carol);
    let id = h.funded_launch();
    h.unleash_as(alice, id);

    let scheduled = h.protocol.schedule_for_retirement(&h.accounts.keeper).unwrap();
    primed(&mut h);
    let converted = h.protocol.convert(&h.accounts.keeper, scheduled).unwrap();
    assert!(converted > 0);

    h.protocol.host_mut().set_bridge_fee(UNIT / 1_000);
    let retirement = h.protocol.retire_and_bridge(&carol, 300_000, &[], UNIT).unwrap();
    assert_eq!(retirement.amount, converted);
    assert_eq!(retirement.fee_refunded, UNIT - UNIT / 1_000);
    assert_eq!(h.protocol.host().remote_transfers()[0].amount, converted);
}
