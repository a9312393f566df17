//! Restart behavior: run-data reload and the duplicate-follow guards.

use crate::support::{engine_over, make_engine, source_trade, tick};
use copytrade_rs::prelude::*;
use std::sync::Arc;

#[test]
fn test_restart_recognizes_followed_signals() {
    let (mut engine, gateway, dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);
    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    engine.handle_command(FollowCommand::Start);

    let trade = source_trade("t1", "rb2410", "SHFE", Direction::Long, Offset::Open, 2);
    engine.handle_event(MarketEvent::Trade(trade.clone()));
    assert_eq!(gateway.sent_ids().len(), 1);
    engine.handle_command(FollowCommand::Stop);
    drop(engine);

    // The gateway replays its whole history after the restart.
    gateway.trades.lock().unwrap().push(trade.clone());

    let mut restarted = engine_over(&dir, Arc::clone(&gateway));
    restarted.init();
    // The follow map survived the restart.
    assert_eq!(restarted.children_of("t1").unwrap().len(), 1);

    restarted.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    restarted.handle_command(FollowCommand::Start);
    restarted.handle_event(MarketEvent::Trade(trade));

    // The replayed trade produces no second child.
    assert_eq!(gateway.sent_ids().len(), 1);
}

#[test]
fn test_already_followed_filter_without_id_seeding() {
    let (mut engine, gateway, dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);
    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    engine.handle_command(FollowCommand::Start);

    let trade = source_trade("t1", "rb2410", "SHFE", Direction::Long, Offset::Open, 2);
    engine.handle_event(MarketEvent::Trade(trade.clone()));
    engine.handle_command(FollowCommand::Stop);
    drop(engine);

    // No init(): the trade-id dedup set is empty, so the replay reaches
    // the filter pipeline and the already-followed filter must catch it.
    let mut restarted = engine_over(&dir, Arc::clone(&gateway));
    restarted.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    restarted.handle_command(FollowCommand::Start);
    restarted.handle_event(MarketEvent::Trade(trade));

    assert_eq!(gateway.sent_ids().len(), 1);
}

#[test]
fn test_restart_restores_positions() {
    let (mut engine, gateway, dir) = make_engine();
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
        2,
    )));
    engine.handle_command(FollowCommand::Stop);
    drop(engine);

    let restarted = engine_over(&dir, Arc::clone(&gateway));
    let entry = restarted.positions().get("rb2410.SHFE").unwrap();
    assert_eq!(entry.source_long, 2);
    assert_eq!(entry.source_net, 2);
}

#[test]
fn test_stop_leaves_working_orders_in_place() {
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
        2,
    )));
    engine.handle_command(FollowCommand::Stop);

    // Stop persists state but must not cancel the working child.
    assert!(gateway.cancelled.lock().unwrap().is_empty());
}

#[test]
fn test_settings_survive_stop() {
    let (mut engine, gateway, dir) = make_engine();
    engine.handle_command(FollowCommand::SetParameter(Parameter::Multiplier(4)));
    engine.handle_command(FollowCommand::Start);
    engine.handle_command(FollowCommand::Stop);
    drop(engine);

    let restarted = engine_over(&dir, Arc::clone(&gateway));
    assert_eq!(restarted.settings().multiplier, 4);
}
