//! # Bondfi bonding curves
//!
//! A curve prices a change in topic supply against a base level:
//!
//! ```text
//! price(base, delta) = F(base + delta) - F(base)
//! ```
//!
//! where `F` is the curve's potential, the pay reserve the curve needs to
//! back a supply of `s`. Defining every curve through a potential makes the
//! pricing contract hold exactly under integer arithmetic:
//!
//! - `price(b, 0) == 0`
//! - `price(b, a) + price(b + a, c) == price(b, a + c)`
//! - `price(b, d)` is strictly increasing in `d` (checked at construction)
//!
//! Supply is capped by the curve's asymptote `B`. Landing exactly on `B`
//! raises [`CurveError::DivisionByZero`]; going beyond raises
//! [`CurveError::Overflow`].

pub mod constant_product;
pub mod errors;
pub mod floor;

pub use constant_product::ConstantProductCurve;
pub use errors::*;
pub use floor::FloorCurve;

use bondfi_types::{Amount, CurveConfig};
use std::fmt;
use std::sync::Arc;

/// Pricing strategy shared by the market and the mortgage engine.
pub trait Curve: fmt::Debug + Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Pay reserve backing a supply of `supply`.
    fn potential(&self, supply: Amount) -> Result<Amount>;

    /// Largest supply the curve can price.
    fn max_supply(&self) -> Amount;

    /// Pay amount for moving supply from `base` to `base + delta`.
    fn price(&self, base: Amount, delta: Amount) -> Result<Amount> {
        if delta == 0 {
            return Ok(0);
        }
        let end = base.checked_add(delta).ok_or(CurveError::Overflow)?;
        let upper = self.potential(end)?;
        let lower = self.potential(base)?;
        upper.checked_sub(lower).ok_or(CurveError::Overflow)
    }
}

/// Build the curve an app selected.
pub fn build_curve(config: &CurveConfig) -> Result<Arc<dyn Curve>> {
    let curve: Arc<dyn Curve> = match *config {
        CurveConfig::Floor {
            numerator,
            asymptote,
        } => Arc::new(FloorCurve::new(numerator, asymptote)?),
        CurveConfig::ConstantProduct {
            virtual_token_reserve,
            virtual_pay_reserve,
        } => Arc::new(ConstantProductCurve::new(
            virtual_token_reserve,
            virtual_pay_reserve,
        )?),
    };
    tracing::debug!(
        target: "curve",
        "Built {} curve (max supply {})",
        curve.name(),
        curve.max_supply()
    );
    Ok(curve)
}

/// Every unit step costs at least one pay unit when `k >= b * (b - 1)`.
pub(crate) fn ensure_strictly_increasing(k: Amount, b: Amount) -> Result<()> {
    let min_k = b
        .checked_mul(b - 1)
        .ok_or(CurveError::InvalidParameters("asymptote too large"))?;
    if k < min_k {
        return Err(CurveError::InvalidParameters(
            "numerator must be at least asymptote * (asymptote - 1)",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_default_curve() {
        let curve = build_curve(&CurveConfig::default()).unwrap();
        assert_eq!(curve.name(), "floor");
        assert_eq!(curve.price(0, 0).unwrap(), 0);
        assert!(curve.price(0, 1_000_000).unwrap() > 0);
    }

    #[test]
    fn test_build_rejects_degenerate_parameters() {
        let config = CurveConfig::ConstantProduct {
            virtual_token_reserve: 1_000,
            virtual_pay_reserve: 1,
        };
        assert!(matches!(
            build_curve(&config),
            Err(CurveError::InvalidParameters(_))
        ));
    }
}
