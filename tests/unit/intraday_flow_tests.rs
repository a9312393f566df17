//! Intraday mode: open/close decomposition and loss-follow accounting.

use crate::support::{make_engine, source_trade, target_position, tick};
use copytrade_rs::prelude::*;

#[test]
fn test_intraday_decomposition_splits_close_and_open() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("IF2403", "CFFEX", 0.2);
    engine.handle_event(MarketEvent::Tick(tick(
        "IF2403", "CFFEX", 3900.0, 3900.2, 4200.0, 3600.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::IntradayTrading(true)));
    engine.handle_command(FollowCommand::Start);

    // Running source traded net of +2; the target holds 2 long to close.
    engine.handle_command(FollowCommand::ModifyPosition {
        vt_symbol: "IF2403.CFFEX".to_string(),
        basic_delta: 0,
        source_traded_net: 2,
        lost_follow_net: 0,
    });
    engine.handle_event(MarketEvent::Position(target_position(
        "IF2403",
        "CFFEX",
        Direction::Long,
        2,
    )));

    // A 5-lot sell against +2: closing leg of 2, opening leg of 3.
    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "IF2403",
        "CFFEX",
        Direction::Short,
        Offset::Close,
        5,
    )));

    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 2);

    let close_leg = &sent[0];
    assert_eq!(close_leg.offset, Offset::Close);
    assert_eq!(close_leg.volume, 2);
    // Must-done leg: aggressive tick offset (25 ticks of 0.2 off the bid).
    assert!((close_leg.price - (3900.0 - 25.0 * 0.2)).abs() < 1e-9);

    let open_leg = &sent[1];
    assert_eq!(open_leg.offset, Offset::Open);
    assert_eq!(open_leg.volume, 3);
    // Ordinary leg: 5 ticks off the bid.
    assert!((open_leg.price - (3900.0 - 5.0 * 0.2)).abs() < 1e-9);

    // The running net updates after decomposition: +2 - 5 = -3.
    assert_eq!(
        engine
            .positions()
            .get("IF2403.CFFEX")
            .unwrap()
            .source_traded_net,
        -3
    );
}

#[test]
fn test_loss_follow_consumed_by_next_close() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("IF2403", "CFFEX", 0.2);
    engine.handle_event(MarketEvent::Tick(tick(
        "IF2403", "CFFEX", 3900.0, 3900.2, 4200.0, 3600.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::IntradayTrading(true)));
    engine.handle_command(FollowCommand::Start);

    // Lost 4 short contracts earlier; running net of -6 makes the next
    // 6-lot buy a pure closing leg.
    engine.handle_command(FollowCommand::ModifyPosition {
        vt_symbol: "IF2403.CFFEX".to_string(),
        basic_delta: 0,
        source_traded_net: -6,
        lost_follow_net: -4,
    });
    engine.handle_event(MarketEvent::Position(target_position(
        "IF2403",
        "CFFEX",
        Direction::Short,
        6,
    )));

    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "IF2403",
        "CFFEX",
        Direction::Long,
        Offset::Close,
        6,
    )));

    // |L + delta| = |-4 + 6| = 2 goes out; the debt is cleared.
    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].volume, 2);
    assert_eq!(
        engine
            .positions()
            .get("IF2403.CFFEX")
            .unwrap()
            .lost_follow_net,
        0
    );
}

#[test]
fn test_loss_follow_absorbs_smaller_close_entirely() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("IF2403", "CFFEX", 0.2);
    engine.handle_event(MarketEvent::Tick(tick(
        "IF2403", "CFFEX", 3900.0, 3900.2, 4200.0, 3600.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::IntradayTrading(true)));
    engine.handle_command(FollowCommand::Start);

    engine.handle_command(FollowCommand::ModifyPosition {
        vt_symbol: "IF2403.CFFEX".to_string(),
        basic_delta: 0,
        source_traded_net: -6,
        lost_follow_net: -4,
    });

    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "IF2403",
        "CFFEX",
        Direction::Long,
        Offset::Close,
        3,
    )));

    // 3 <= |-4|: nothing goes out, debt shrinks to -1.
    assert!(gateway.sent_ids().is_empty());
    assert_eq!(
        engine
            .positions()
            .get("IF2403.CFFEX")
            .unwrap()
            .lost_follow_net,
        -1
    );
}

#[test]
fn test_locked_product_keeps_close_today_offset() {
    let (mut engine, gateway, _dir) = make_engine();
    gateway.add_contract("rb2410", "SHFE", 0.02);
    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 100.0, 100.1, 110.0, 90.0,
    )));
    engine.handle_command(FollowCommand::SetParameter(Parameter::IntradaySymbols(
        vec!["rb".to_string()],
    )));
    engine.handle_command(FollowCommand::Start);

    engine.handle_event(MarketEvent::Trade(source_trade(
        "t1",
        "rb2410",
        "SHFE",
        Direction::Short,
        Offset::CloseToday,
        2,
    )));

    // Locked mode: the offset survives untouched and no holding clamp ran.
    let sent = gateway.sent_requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].offset, Offset::CloseToday);
    assert_eq!(sent[0].volume, 2);
}
