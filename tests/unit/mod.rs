//! End-to-end scenario tests driving the engine through its public API.

mod support;

mod bus_tests;
mod chase_flow_tests;
mod follow_flow_tests;
mod intraday_flow_tests;
mod persistence_tests;
mod sync_flow_tests;
