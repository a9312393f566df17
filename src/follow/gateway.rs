//! Broker gateway surface.
//!
//! The engine never talks a broker protocol itself; everything outbound
//! goes through this trait. One implementation typically fronts several
//! connected gateways and routes by `gateway_name`, which is how the engine
//! distinguishes the source and target accounts.

use crate::follow::types::{
    AccountData, CancelRequest, ContractData, OrderData, OrderRequest, TradeData,
};

/// Outbound surface from the engine to the broker adapters.
pub trait Gateway: Send + Sync {
    /// Subscribe to market data for a contract. Returns `false` when the
    /// contract is unknown to every connected gateway.
    fn subscribe(&self, symbol: &str, exchange: &str, gateway_name: &str) -> bool;

    /// Send an order through the named gateway. Returns the assigned order
    /// id, or `None` when the gateway refused the request.
    fn send_order(&self, req: &OrderRequest, gateway_name: &str) -> Option<String>;

    /// Cancel a working order through the named gateway.
    fn cancel_order(&self, req: &CancelRequest, gateway_name: &str);

    /// Contract metadata lookup by canonical key.
    fn get_contract(&self, vt_symbol: &str) -> Option<ContractData>;

    /// Current state of one order.
    fn get_order(&self, orderid: &str) -> Option<OrderData>;

    /// All working orders, optionally restricted to one contract.
    fn get_all_active_orders(&self, vt_symbol: Option<&str>) -> Vec<OrderData>;

    /// Every fill seen this session, across all gateways.
    fn get_all_trades(&self) -> Vec<TradeData>;

    /// Account snapshots of all connected gateways.
    fn get_all_accounts(&self) -> Vec<AccountData>;
}
