//! In-memory gateway and fixtures shared by the scenario tests.

use copytrade_rs::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const SOURCE: &str = "CTP";
pub const TARGET: &str = "RPC";

/// Scripted gateway: serves contracts and order state, records every send,
/// cancel and subscription.
#[derive(Default)]
pub struct SimGateway {
    pub contracts: Mutex<HashMap<String, ContractData>>,
    pub orders: Mutex<HashMap<String, OrderData>>,
    pub sent: Mutex<Vec<(OrderRequest, String)>>,
    pub cancelled: Mutex<Vec<CancelRequest>>,
    pub subscribed: Mutex<Vec<String>>,
    pub trades: Mutex<Vec<TradeData>>,
    pub accounts: Mutex<Vec<AccountData>>,
    next_id: AtomicU64,
}

impl SimGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contract(&self, symbol: &str, exchange: &str, pricetick: f64) {
        let contract = ContractData {
            symbol: symbol.to_string(),
            exchange: exchange.to_string(),
            pricetick,
        };
        self.contracts
            .lock()
            .unwrap()
            .insert(contract.vt_symbol(), contract);
    }

    pub fn sent_ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id)| id.clone())
            .collect()
    }

    pub fn sent_requests(&self) -> Vec<OrderRequest> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(req, _)| req.clone())
            .collect()
    }
}

impl Gateway for SimGateway {
    fn subscribe(&self, symbol: &str, exchange: &str, _gateway_name: &str) -> bool {
        self.subscribed
            .lock()
            .unwrap()
            .push(format!("{symbol}.{exchange}"));
        true
    }

    fn send_order(&self, req: &OrderRequest, gateway_name: &str) -> Option<String> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let orderid = format!("SIM.{n}");
        self.sent.lock().unwrap().push((req.clone(), orderid.clone()));
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
        self.cancelled.lock().unwrap().push(req.clone());
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
        self.trades.lock().unwrap().clone()
    }

    fn get_all_accounts(&self) -> Vec<AccountData> {
        self.accounts.lock().unwrap().clone()
    }
}

/// Engine over a fresh temp store, pinned to the deterministic test clock.
pub fn make_engine() -> (FollowEngine<SimGateway>, Arc<SimGateway>, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let gateway = Arc::new(SimGateway::new());
    let engine = engine_over(&dir, Arc::clone(&gateway));
    (engine, gateway, dir)
}

/// Engine reusing an existing store directory and gateway (restart tests).
pub fn engine_over(dir: &TempDir, gateway: Arc<SimGateway>) -> FollowEngine<SimGateway> {
    let store = DataStore::open(dir.path()).expect("store");
    let mut engine = FollowEngine::new(store, gateway, Box::new(NetPositionConverter::new()))
        .expect("engine");
    engine.set_parameter(Parameter::FilterOrderVolume(false));
    engine.set_parameter(Parameter::RunType(RunType::Test));
    engine
}

pub fn tick(symbol: &str, exchange: &str, bid: f64, ask: f64, up: f64, down: f64) -> TickData {
    TickData {
        symbol: symbol.to_string(),
        exchange: exchange.to_string(),
        datetime: chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
        bid_price_1: bid,
        ask_price_1: ask,
        limit_up: up,
        limit_down: down,
    }
}

pub fn source_trade(
    tradeid: &str,
    symbol: &str,
    exchange: &str,
    direction: Direction,
    offset: Offset,
    volume: u64,
) -> TradeData {
    TradeData {
        gateway_name: SOURCE.to_string(),
        tradeid: tradeid.to_string(),
        orderid: format!("{tradeid}-order"),
        symbol: symbol.to_string(),
        exchange: exchange.to_string(),
        direction,
        offset,
        price: 100.0,
        volume,
        time: "10:00:00".to_string(),
    }
}

pub fn target_position(symbol: &str, exchange: &str, direction: Direction, volume: u64) -> PositionData {
    PositionData {
        gateway_name: TARGET.to_string(),
        symbol: symbol.to_string(),
        exchange: exchange.to_string(),
        direction,
        volume,
    }
}
