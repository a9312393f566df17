//! Example demonstrating the manual synchronization planners
//!
//! Seeds a position difference between the accounts, then runs the
//! leg-wise and net-delta sync planners and prints the orders each one
//! issues.

use copytrade_rs::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Default)]
struct PrintingBroker {
    contracts: Mutex<HashMap<String, ContractData>>,
    orders: Mutex<HashMap<String, OrderData>>,
    next_id: AtomicU64,
}

impl Gateway for PrintingBroker {
    fn subscribe(&self, _symbol: &str, _exchange: &str, _gateway_name: &str) -> bool {
        true
    }

    fn send_order(&self, req: &OrderRequest, gateway_name: &str) -> Option<String> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let orderid = format!("SYNC-DEMO.{n}");
        info!(
            "planner issued: {} {} {} x{} @ {} ({})",
            gateway_name, req.direction, req.offset, req.volume, req.price, req.reference
        );
        self.orders.lock().unwrap().insert(
            orderid.clone(),
            OrderData {
                gateway_name: gateway_name.to_string(),
                orderid: orderid.clone(),
                symbol: req.symbol.clone(),
                exchange: req.exchange.clone(),
                direction: req.direction,
                offset: req.offset,
                order_type: req.order_type,
                price: req.price,
                volume: req.volume,
                traded: 0,
                status: Status::NotTraded,
                time: "10:00:00".to_string(),
            },
        );
        Some(orderid)
    }

    fn cancel_order(&self, req: &CancelRequest, _gateway_name: &str) {
        info!("planner cancelled residual {}", req.orderid);
    }

    fn get_contract(&self, vt_symbol: &str) -> Option<ContractData> {
        self.contracts.lock().unwrap().get(vt_symbol).cloned()
    }

    fn get_order(&self, orderid: &str) -> Option<OrderData> {
        self.orders.lock().unwrap().get(orderid).cloned()
    }

    fn get_all_active_orders(&self, vt_symbol: Option<&str>) -> Vec<OrderData> {
        self.orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.is_active())
            .filter(|o| vt_symbol.is_none_or(|s| o.vt_symbol() == s))
            .cloned()
            .collect()
    }

    fn get_all_trades(&self) -> Vec<TradeData> {
        Vec::new()
    }

    fn get_all_accounts(&self) -> Vec<AccountData> {
        Vec::new()
    }
}

fn tick(symbol: &str, exchange: &str, bid: f64, ask: f64, up: f64, down: f64) -> TickData {
    TickData {
        symbol: symbol.to_string(),
        exchange: exchange.to_string(),
        datetime: chrono::Local::now().naive_local(),
        bid_price_1: bid,
        ask_price_1: ask,
        limit_up: up,
        limit_down: down,
    }
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    info!("=== Manual Sync Demo ===");

    let data_dir = tempfile::tempdir().expect("temp data dir");
    let store = DataStore::open(data_dir.path()).expect("store");

    let broker = Arc::new(PrintingBroker::default());
    {
        let mut contracts = broker.contracts.lock().unwrap();
        for (symbol, pricetick) in [("rb2410", 1.0), ("ni2405", 10.0)] {
            contracts.insert(
                format!("{symbol}.SHFE"),
                ContractData {
                    symbol: symbol.to_string(),
                    exchange: "SHFE".to_string(),
                    pricetick,
                },
            );
        }
    }

    let mut engine = FollowEngine::new(
        store,
        Arc::clone(&broker),
        Box::new(NetPositionConverter::new()),
    )
    .expect("engine");
    engine.set_parameter(Parameter::IntradaySymbols(vec!["ni".to_string()]));
    engine.init();
    engine.start();

    engine.handle_event(MarketEvent::Tick(tick(
        "rb2410", "SHFE", 3650.0, 3651.0, 3900.0, 3400.0,
    )));
    engine.handle_event(MarketEvent::Tick(tick(
        "ni2405", "SHFE", 140_000.0, 140_010.0, 150_000.0, 130_000.0,
    )));

    // rb2410: the target lags 3 on the long leg and holds 2 shorts too
    // many.
    engine.handle_command(FollowCommand::SetPosition {
        vt_symbol: "rb2410.SHFE".to_string(),
        field: PosField::SourceLong,
        value: 5,
    });
    engine.handle_command(FollowCommand::SetPosition {
        vt_symbol: "rb2410.SHFE".to_string(),
        field: PosField::TargetLong,
        value: 2,
    });
    engine.handle_event(MarketEvent::Position(PositionData {
        gateway_name: "RPC".to_string(),
        symbol: "rb2410".to_string(),
        exchange: "SHFE".to_string(),
        direction: Direction::Short,
        volume: 2,
    }));

    info!("--- combined leg sync for rb2410.SHFE ---");
    engine.handle_command(FollowCommand::SyncBoth("rb2410.SHFE".to_string()));

    // ni2405 trades intraday: only net sync applies.
    engine.handle_command(FollowCommand::SetPosition {
        vt_symbol: "ni2405.SHFE".to_string(),
        field: PosField::SourceLong,
        value: 4,
    });

    info!("--- net sync for ni2405.SHFE ---");
    engine.handle_command(FollowCommand::SyncNet {
        vt_symbol: "ni2405.SHFE".to_string(),
        basic: false,
    });

    engine.stop();
    info!("done");
}
