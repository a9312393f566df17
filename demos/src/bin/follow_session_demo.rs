//! Example demonstrating a complete simulated follow session
//!
//! This example shows how to:
//! 1. Implement the `Gateway` trait over an in-memory broker
//! 2. Wire the engine to the std event bus with log/position listeners
//! 3. Feed ticks, source trades and order status pushes through the bus
//! 4. Watch follow orders come out the other side

use copytrade_rs::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Minimal in-memory broker: hands out sequential order ids and remembers
/// everything the engine asks of it.
#[derive(Default)]
struct DemoBroker {
    contracts: Mutex<HashMap<String, ContractData>>,
    orders: Mutex<HashMap<String, OrderData>>,
    next_id: AtomicU64,
}

impl DemoBroker {
    fn with_contract(symbol: &str, exchange: &str, pricetick: f64) -> Self {
        let broker = Self::default();
        let contract = ContractData {
            symbol: symbol.to_string(),
            exchange: exchange.to_string(),
            pricetick,
        };
        broker
            .contracts
            .lock()
            .unwrap()
            .insert(contract.vt_symbol(), contract);
        broker
    }
}

impl Gateway for DemoBroker {
    fn subscribe(&self, symbol: &str, exchange: &str, gateway_name: &str) -> bool {
        info!("subscribe {symbol}.{exchange} via {gateway_name}");
        true
    }

    fn send_order(&self, req: &OrderRequest, gateway_name: &str) -> Option<String> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let orderid = format!("DEMO.{n}");
        info!(
            "send {} {} {} x{} @ {} -> {orderid}",
            gateway_name, req.direction, req.offset, req.volume, req.price
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
                time: "09:30:00".to_string(),
            },
        );
        Some(orderid)
    }

    fn cancel_order(&self, req: &CancelRequest, gateway_name: &str) {
        info!("cancel {} via {gateway_name}", req.orderid);
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
        vec![
            AccountData {
                gateway_name: "CTP".to_string(),
                accountid: "100001".to_string(),
                balance: 1_000_000.0,
                available: 800_000.0,
            },
            AccountData {
                gateway_name: "RPC".to_string(),
                accountid: "200002".to_string(),
                balance: 500_000.0,
                available: 400_000.0,
            },
        ]
    }
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    info!("=== Follow Session Demo ===");

    let data_dir = tempfile::tempdir().expect("temp data dir");
    let store = DataStore::open(data_dir.path()).expect("store");
    let broker = Arc::new(DemoBroker::with_contract("rb2410", "SHFE", 1.0));

    let mut engine = FollowEngine::new(
        store,
        Arc::clone(&broker),
        Box::new(NetPositionConverter::new()),
    )
    .expect("engine");

    let log_listener: LogListener = Arc::new(|event: &LogEvent| {
        info!("[engine] {}", event.message);
    });
    engine.set_log_listener(log_listener);

    let pos_listener: PosDeltaListener = Arc::new(|delta: &PosDeltaEvent| {
        info!(
            "[positions] {} source_net={} target_net={} net_delta={}",
            delta.vt_symbol, delta.source_net, delta.target_net, delta.net_delta
        );
    });
    engine.set_pos_delta_listener(pos_listener);
    engine.init();

    let mut bus = FollowBusStd::new();
    let sender = bus.sender();
    let handle = bus.start(engine);

    // Market data arrives, the operator starts the engine, the source
    // account trades.
    sender
        .send(BusMessage::Event(MarketEvent::Tick(TickData {
            symbol: "rb2410".to_string(),
            exchange: "SHFE".to_string(),
            datetime: chrono::Local::now().naive_local(),
            bid_price_1: 3650.0,
            ask_price_1: 3651.0,
            limit_up: 3900.0,
            limit_down: 3400.0,
        })))
        .unwrap();
    sender
        .send(BusMessage::Command(FollowCommand::SetParameter(
            Parameter::FilterOrderVolume(false),
        )))
        .unwrap();
    sender
        .send(BusMessage::Command(FollowCommand::Start))
        .unwrap();

    sender
        .send(BusMessage::Event(MarketEvent::Trade(TradeData {
            gateway_name: "CTP".to_string(),
            tradeid: "T0001".to_string(),
            orderid: "O0001".to_string(),
            symbol: "rb2410".to_string(),
            exchange: "SHFE".to_string(),
            direction: Direction::Long,
            offset: Offset::Open,
            price: 3651.0,
            volume: 2,
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
        })))
        .unwrap();

    sender
        .send(BusMessage::Command(FollowCommand::Stop))
        .unwrap();
    // Every sender has to go, including the one the bus holds, before the
    // loop winds down.
    drop(sender);
    drop(bus);

    let engine = handle.join().expect("engine loop");
    info!(
        "session over, tracked contracts: {}",
        engine.positions().len()
    );
}
