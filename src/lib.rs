//! margin-rebalancer: margin-aware portfolio rebalance planning.
//!
//! Consumes an already-priced portfolio snapshot and a desired allocation,
//! then decides which holdings are margin-financed and how risky that is,
//! whether to unwind margin before the session closes, how to fund purchases
//! of instruments that cannot be margin-traded by selling other holdings,
//! and whether accumulated profit justifies closing a position. Order
//! submission is a downstream concern; nothing here talks to a broker.

pub mod audit;
pub mod config;
pub mod error;
pub mod expenses;
pub mod funding;
pub mod margin;
pub mod money;
pub mod planner;
pub mod profit;
pub mod wallet;
