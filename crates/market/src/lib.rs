//! # Bondfi market
//!
//! Per-app bonding-curve market over topic tokens, with a mortgage engine
//! that locks tokens as collateral and pays out their curve valuation.
//!
//! - [`Market`]: buy, sell, mortgage, redeem, split and transfers, each
//!   atomic under one write lock
//! - [`AppRegistry`]: app configurations and topic registrations, consulted
//!   on every call
//! - [`config::load_app_config`]: TOML plus `BONDFI_` environment overrides
//!
//! Supply accounting: for every topic, Σ balances (market account included)
//! equals total supply after every call, and the market account holds at
//! least the collateral recorded in open positions.

pub mod audit;
pub mod config;
pub mod errors;
pub mod events;
pub mod market;
pub mod quote;
pub mod registry;

pub use audit::{AuditViolation, MarketSnapshot, SupplyAudit, TopicSnapshot};
pub use errors::*;
pub use events::MarketEvent;
pub use market::Market;
pub use quote::{MortgageReceipt, Quote, SplitReceipt};
pub use registry::{AppRegistry, TopicConfig};
