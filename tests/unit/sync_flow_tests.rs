//! Manual synchronization through the command surface.

use crate::support::{make_engine, target_position, tick};
use copytrade_rs::prelude::*;

#[test]
fn test_manual_net_sync_issues_sync_order() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("ni2405", "SHFE", 10.0);
    engine.handle_event(MarketEvent::Tick(tick(
        "ni2405", "SHFE", 140_000.0, 140_010.0, 150_000.0, 130_000.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::IntradaySymbols(
        vec!["ni".to_string()],
    )));
    engine.handle_command(FollowCommand::Start);

    // Source net +5 vs target net +2.
    engine.handle_command(FollowCommand::SetPosition {
        vt_symbol: "ni2405.SHFE".to_string(),
        field: PosField::SourceLong,
        value: 5,
    });
    engine.handle_event(MarketEvent::Position(target_position(
        "ni2405",
        "SHFE",
        Direction::Long,
        2,
    )));

    engine.handle_command(FollowCommand::SyncNet {
        vt_symbol: "ni2405.SHFE".to_string(),
        basic: false,
    });

    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].direction, Direction::Long);
    assert_eq!(sent[0].volume, 3);
    assert_eq!(sent[0].reference, RefTag::Sync);
    // Sync orders price off the configured sync base (opposite top of
    // book) with the must-done tick offset.
    assert!((sent[0].price - (140_010.0 + 25.0 * 10.0)).abs() < 1e-9);
}

#[test]
fn test_sync_fill_updates_target_counters() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("ni2405", "SHFE", 10.0);
    engine.handle_event(MarketEvent::Tick(tick(
        "ni2405", "SHFE", 140_000.0, 140_010.0, 150_000.0, 130_000.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::IntradaySymbols(
        vec!["ni".to_string()],
    )));
    engine.handle_command(FollowCommand::Start);
    engine.handle_command(FollowCommand::SetPosition {
        vt_symbol: "ni2405.SHFE".to_string(),
        field: PosField::SourceLong,
        value: 3,
    });

    engine.handle_command(FollowCommand::SyncNet {
        vt_symbol: "ni2405.SHFE".to_string(),
        basic: false,
    });
    let orderid = gateway.sent_ids()[0].clone();

    // The sync order fills at the target; counters follow.
    engine.handle_event(MarketEvent::Trade(TradeData {
        gateway_name: crate::support::TARGET.to_string(),
        tradeid: "ft1".to_string(),
        orderid,
        symbol: "ni2405".to_string(),
        exchange: "SHFE".to_string(),
        direction: Direction::Long,
        offset: Offset::Open,
        price: 140_020.0,
        volume: 3,
        time: "10:00:01".to_string(),
    }));

    let entry = engine.positions().get("ni2405.SHFE").unwrap();
    assert_eq!(entry.target_long, 3);
    assert_eq!(entry.target_net, 3);
    assert_eq!(entry.net_delta, 0, "accounts reconciled");
}

#[test]
fn test_basic_sync_zeroes_baseline() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("ni2405", "SHFE", 10.0);
    engine.handle_event(MarketEvent::Tick(tick(
        "ni2405", "SHFE", 140_000.0, 140_010.0, 150_000.0, 130_000.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::IntradaySymbols(
        vec!["ni".to_string()],
    )));
    engine.handle_command(FollowCommand::Start);
    engine.handle_command(FollowCommand::SetPosition {
        vt_symbol: "ni2405.SHFE".to_string(),
        field: PosField::SourceLong,
        value: 2,
    });
    engine.handle_command(FollowCommand::ModifyPosition {
        vt_symbol: "ni2405.SHFE".to_string(),
        basic_delta: 9,
        source_traded_net: 0,
        lost_follow_net: 0,
    });

    engine.handle_command(FollowCommand::SyncNet {
        vt_symbol: "ni2405.SHFE".to_string(),
        basic: true,
    });

    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reference, RefTag::Basic);
    // Baseline sync goes out at the hard limit (market emulation).
    assert_eq!(sent[0].price, 150_000.0);
    assert_eq!(
        engine.positions().get("ni2405.SHFE").unwrap().basic_delta,
        0
    );
}

#[test]
fn test_cancel_all_command_sweeps_follow_orders() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("ni2405", "SHFE", 10.0);
    engine.handle_event(MarketEvent::Tick(tick(
        "ni2405", "SHFE", 140_000.0, 140_010.0, 150_000.0, 130_000.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::IntradaySymbols(
        vec!["ni".to_string()],
    )));
    engine.handle_command(FollowCommand::Start);
    engine.handle_command(FollowCommand::SetPosition {
        vt_symbol: "ni2405.SHFE".to_string(),
        field: PosField::SourceLong,
        value: 3,
    });
    engine.handle_command(FollowCommand::SyncNet {
        vt_symbol: "ni2405.SHFE".to_string(),
        basic: false,
    });
    assert_eq!(gateway.sent_ids().len(), 1);

    engine.handle_command(FollowCommand::CancelAll {
        vt_symbol: None,
        allow_resend: false,
        only_fail_chase: false,
    });
    assert_eq!(gateway.cancelled.lock().unwrap().len(), 1);
}
