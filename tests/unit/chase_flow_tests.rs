//! Timer-driven timeout cancellation and the chase loop, end to end.

use crate::support::{make_engine, source_trade, target_position, tick};
use copytrade_rs::prelude::*;

/// Start an engine with chase enabled and one must-done close working.
fn chase_setup() -> (
    FollowEngine<crate::support::SimGateway>,
    std::sync::Arc<crate::support::SimGateway>,
    tempfile::TempDir,
    String,
) {
    let (mut engine, gateway, dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);
    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::ChaseOrder(true)));
    engine.handle_command(FollowCommand::SetParameter(Parameter::ChaseOrderTimeout(10)));
    engine.handle_command(FollowCommand::SetParameter(Parameter::CancelOrderTimeout(10)));
    engine.handle_command(FollowCommand::Start);

    engine.handle_event(MarketEvent::Position(target_position(
        "rb2410",
        "SHFE",
        Direction::Long,
        5,
    )));
    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "rb2410",
        "SHFE",
        Direction::Short,
        Offset::Close,
        5,
    )));
    let child = gateway.sent_ids()[0].clone();
    (engine, gateway, dir, child)
}

#[test]
fn test_timeout_then_chase_resend() {
    let (mut engine, gateway, _dir, child) = chase_setup();

    // The child starts working at the target.
    let order = gateway.get_order(&child).unwrap();
    engine.handle_event(MarketEvent::Order(order.clone()));

    // Eleven-plus seconds on the clock trip the timeout cancel.
    for _ in 0..12 {
        engine.handle_event(MarketEvent::Timer);
    }
    assert_eq!(gateway.cancelled.lock().unwrap().len(), 1);

    // The cancel completes with 2 of 5 filled: a more aggressive resend
    // for the remainder goes out.
    let mut cancelled = order;
    cancelled.traded = 2;
    cancelled.status = Status::Cancelled;
    let old_price = cancelled.price;
    engine.handle_event(MarketEvent::Order(cancelled));

    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].volume, 3);
    assert_eq!(sent[1].reference, RefTag::Chase);
    assert!(sent[1].price < old_price, "short chase reprices downward");
}

#[test]
fn test_chase_stops_at_budget_and_keeps_replacement() {
    let (mut engine, gateway, _dir, child) = chase_setup();
    engine.handle_command(FollowCommand::SetParameter(Parameter::ChaseMaxResend(2)));
    engine.handle_command(FollowCommand::SetParameter(Parameter::KeepOrderAfterChase(
        true,
    )));

    // Cancel each working chase order in turn.
    let mut last = child.clone();
    for _ in 0..3 {
        let mut order = gateway.get_order(&last).unwrap();
        order.status = Status::Cancelled;
        engine.handle_event(MarketEvent::Order(order));
        last = gateway.sent_ids().last().unwrap().clone();
    }

    // Original + 2 resends + 1 keep-chase replacement.
    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[3].reference, RefTag::KeepChase);

    // The replacement is never cancel-timed.
    let keep = gateway.sent_ids()[3].clone();
    let keep_order = gateway.get_order(&keep).unwrap();
    engine.handle_event(MarketEvent::Order(keep_order));
    for _ in 0..30 {
        engine.handle_event(MarketEvent::Timer);
    }
    let cancels = gateway.cancelled.lock().unwrap();
    assert!(cancels.iter().all(|c| c.orderid != keep));
}

#[test]
fn test_resend_count_stays_within_budget() {
    let (mut engine, gateway, _dir, child) = chase_setup();
    engine.handle_command(FollowCommand::SetParameter(Parameter::ChaseMaxResend(3)));

    let mut last = child.clone();
    for _ in 0..6 {
        let mut order = gateway.get_order(&last).unwrap();
        order.status = Status::Cancelled;
        engine.handle_event(MarketEvent::Order(order));
        last = gateway.sent_ids().last().unwrap().clone();
    }

    // chase_resend_count[ancestor] never exceeds chase_max_resend.
    assert_eq!(gateway.sent_ids().len(), 4);
}
