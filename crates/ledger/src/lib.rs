//! Bondfi ledgers
//!
//! State mutated only by the market engine:
//! - [`tokens`]: per-topic fungible balances and total supply. Tokens held by
//!   the market account are active mortgage collateral.
//! - [`positions`]: non-fungible collateral records with an explicit
//!   `id → owner` map.

pub mod errors;
pub mod positions;
pub mod tokens;

pub use errors::*;
pub use positions::{InMemoryPositionRegistry, Position, PositionInfo, PositionStore};
pub use tokens::{InMemoryTokenLedger, TokenLedger, TopicBook};
