//! Bus runners: ordered delivery from producer threads to the one consumer.

use crate::support::{engine_over, make_engine, source_trade, tick};
use copytrade_rs::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_std_bus_drives_engine_and_returns_it() {
    let (engine, gateway, _dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);

    let mut bus = FollowBusStd::new();
    let sender = bus.sender();
    let handle = bus.start(engine);

    sender
        .send(BusMessage::Event(MarketEvent::Tick(tick(
            "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
        ))))
        .unwrap();
    sender
        .send(BusMessage::Command(FollowCommand::Start))
        .unwrap();
    sender
        .send(BusMessage::Event(MarketEvent::Trade(source_trade(
            "t1",
            "rb2410",
            "SHFE",
            Direction::Long,
            Offset::Open,
            2,
        ))))
        .unwrap();

    // Dropping every sender (the bus holds one too) ends the loop and
    // returns the engine.
    drop(sender);
    drop(bus);
    let engine = handle.join().unwrap();

    assert_eq!(gateway.sent_ids().len(), 1);
    assert!(engine.is_active());
    assert_eq!(engine.children_of("t1").unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tokio_bus_drives_engine_and_returns_it() {
    let dir = TempDir::new().unwrap();
    let gateway = Arc::new(crate::support::SimGateway::new());
    gateway.add_contract("rb2410", "SHFE", 0.02);
    let engine = engine_over(&dir, Arc::clone(&gateway));

    let mut bus = FollowBusTokio::new();
    let sender = bus.sender();
    let handle = bus.start(engine);

    sender
        .send(BusMessage::Event(MarketEvent::Tick(tick(
            "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
        ))))
        .unwrap();
    sender
        .send(BusMessage::Command(FollowCommand::Start))
        .unwrap();
    sender
        .send(BusMessage::Event(MarketEvent::Trade(source_trade(
            "t1",
            "rb2410",
            "SHFE",
            Direction::Long,
            Offset::Open,
            2,
        ))))
        .unwrap();

    drop(sender);
    drop(bus);
    let engine = handle.await.unwrap();

    assert_eq!(gateway.sent_ids().len(), 1);
    assert!(engine.is_active());
}

#[test]
fn test_timer_messages_drive_the_queue() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);
    engine.handle_command(FollowCommand::Start);
    engine.handle_event(MarketEvent::Tick(tick(
        "cu2412", "SHFE", 70.0, 70.1, 77.0, 63.0,
    )));

    // Unpriced symbol: queued.
    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "rb2410",
        "SHFE",
        Direction::Long,
        Offset::Open,
        1,
    )));
    assert!(gateway.sent_ids().is_empty());

    let mut bus = FollowBusStd::new();
    let sender = bus.sender();
    let handle = bus.start(engine);

    sender
        .send(BusMessage::Event(MarketEvent::Tick(tick(
            "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
        ))))
        .unwrap();
    sender
        .send(BusMessage::Event(MarketEvent::Timer))
        .unwrap();
    drop(sender);
    drop(bus);
    handle.join().unwrap();

    assert_eq!(gateway.sent_ids().len(), 1);
}
