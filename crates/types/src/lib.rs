//! Bondfi shared types
//!
//! Identifiers, units, NFT owner splits and per-app configuration shared by
//! the curve, fee, payment, ledger and market crates.

pub mod app;
pub mod ids;
pub mod nft;
pub mod units;

pub use app::*;
pub use ids::*;
pub use nft::*;
pub use units::*;
