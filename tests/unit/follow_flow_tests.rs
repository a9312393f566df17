//! Single-follow flow: filter, build, price, dispatch.

use crate::support::{TARGET, make_engine, source_trade, tick};
use copytrade_rs::prelude::*;

#[test]
fn test_single_follow_long_open() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);
    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    engine.handle_command(FollowCommand::Start);

    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "rb2410",
        "SHFE",
        Direction::Long,
        Offset::Open,
        3,
    )));

    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 1);
    let req = &sent[0];
    assert_eq!(req.direction, Direction::Long);
    assert_eq!(req.offset, Offset::Open);
    assert_eq!(req.volume, 3, "multiplier 1 keeps the volume");
    // Opposite top-of-book plus 5 ticks of 0.02, clamped by limit-up.
    assert!((req.price - 100.2).abs() < 1e-9);
    assert_eq!(req.reference, RefTag::TradeMod);

    assert_eq!(engine.children_of("t1").unwrap().len(), 1);
}

#[test]
fn test_price_clamped_to_limit_up() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 1.0);
    // Ask one tick under the limit: the offset must clamp.
    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 109.0, 109.5, 110.0, 90.0,
    )));
    engine.handle_command(FollowCommand::Start);

    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "rb2410",
        "SHFE",
        Direction::Long,
        Offset::Open,
        1,
    )));

    let sent = gateway.sent_requests();
    assert_eq!(sent[0].price, 110.0);
}

#[test]
fn test_volume_split_emits_equal_pieces_plus_remainder() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("IF2403", "CFFEX", 0.2);
    engine.handle_event(MarketEvent::Tick(tick(
        "IF2403", "CFFEX", 3900.0, 3900.2, 4200.0, 3600.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::SingleMax(20)));
    engine.handle_command(FollowCommand::Start);

    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "IF2403",
        "CFFEX",
        Direction::Long,
        Offset::Open,
        45,
    )));

    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].volume, 20);
    assert_eq!(sent[1].volume, 20);
    assert_eq!(sent[2].volume, 5);
    // All three children belong to the one signal.
    assert_eq!(engine.children_of("t1").unwrap().len(), 3);
}

#[test]
fn test_orders_route_to_target_gateway() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);
    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    engine.handle_command(FollowCommand::Start);

    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "rb2410",
        "SHFE",
        Direction::Long,
        Offset::Open,
        1,
    )));

    let orders = gateway.orders.lock().unwrap();
    assert!(orders.values().all(|o| o.gateway_name == TARGET));
    drop(orders);

    // Source-account events from an unknown gateway are ignored entirely.
    let mut foreign = source_trade("t2", "rb2410", "SHFE", Direction::Long, Offset::Open, 1);
    foreign.gateway_name = "SOMEONE_ELSE".to_string();
    engine.handle_event(MarketEvent::Trade(foreign));
    assert_eq!(gateway.sent_ids().len(), 1);
}

#[test]
fn test_queued_request_waits_for_pricing() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);
    engine.handle_command(FollowCommand::Start);
    // Pin the test clock without pricing rb2410.
    engine.handle_event(MarketEvent::Tick(tick(
        "cu2412", "SHFE", 70.0, 70.1, 77.0, 63.0,
    )));

    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "rb2410",
        "SHFE",
        Direction::Long,
        Offset::Open,
        1,
    )));
    assert!(gateway.sent_ids().is_empty());
    assert!(
        gateway
            .subscribed
            .lock()
            .unwrap()
            .contains(&"rb2410.SHFE".to_string())
    );

    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    engine.handle_event(MarketEvent::Timer);
    assert_eq!(gateway.sent_ids().len(), 1);
}
