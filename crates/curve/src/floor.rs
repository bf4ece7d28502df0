//! Inverse-square floor curve
//!
//! Marginal price `K / (B - s)²`, whose potential is `F(s) = ⌊K / (B - s)⌋`.
//! Price grows without bound as supply approaches the asymptote `B`, so the
//! curve itself caps how much can be issued in one call.

use crate::errors::*;
use crate::{ensure_strictly_increasing, Curve};
use bondfi_types::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorCurve {
    numerator: Amount,
    asymptote: Amount,
}

impl FloorCurve {
    pub fn new(numerator: Amount, asymptote: Amount) -> Result<Self> {
        if asymptote < 2 {
            return Err(CurveError::InvalidParameters("asymptote must be at least 2"));
        }
        ensure_strictly_increasing(numerator, asymptote)?;
        Ok(Self {
            numerator,
            asymptote,
        })
    }

    pub fn numerator(&self) -> Amount {
        self.numerator
    }

    pub fn asymptote(&self) -> Amount {
        self.asymptote
    }
}

impl Curve for FloorCurve {
    fn name(&self) -> &'static str {
        "floor"
    }

    fn potential(&self, supply: Amount) -> Result<Amount> {
        let remaining = self
            .asymptote
            .checked_sub(supply)
            .ok_or(CurveError::Overflow)?;
        self.numerator
            .checked_div(remaining)
            .ok_or(CurveError::DivisionByZero)
    }

    fn max_supply(&self) -> Amount {
        self.asymptote - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> FloorCurve {
        // K = 10^12, B = 10^4
        FloorCurve::new(1_000_000_000_000, 10_000).unwrap()
    }

    #[test]
    fn test_zero_delta_is_free() {
        let curve = small();
        assert_eq!(curve.price(0, 0).unwrap(), 0);
        assert_eq!(curve.price(9_000, 0).unwrap(), 0);
    }

    #[test]
    fn test_known_values() {
        let curve = small();
        // F(0) = 10^8, F(5000) = 2 * 10^8
        assert_eq!(curve.potential(0).unwrap(), 100_000_000);
        assert_eq!(curve.potential(5_000).unwrap(), 200_000_000);
        assert_eq!(curve.price(0, 5_000).unwrap(), 100_000_000);
        // last representable unit costs the most
        assert_eq!(curve.potential(9_999).unwrap(), 1_000_000_000_000);
    }

    #[test]
    fn test_additivity_on_split_interval() {
        let curve = small();
        let whole = curve.price(1_234, 4_000).unwrap();
        let left = curve.price(1_234, 1_500).unwrap();
        let right = curve.price(2_734, 2_500).unwrap();
        assert_eq!(left + right, whole);
    }

    #[test]
    fn test_later_units_cost_more() {
        let curve = small();
        let early = curve.price(0, 100).unwrap();
        let late = curve.price(5_000, 100).unwrap();
        assert!(late > early);
    }

    #[test]
    fn test_boundary_fault_classes() {
        let curve = small();
        assert_eq!(curve.max_supply(), 9_999);
        assert!(curve.price(0, 9_999).is_ok());
        assert_eq!(curve.price(0, 10_000), Err(CurveError::DivisionByZero));
        assert_eq!(curve.price(0, 10_001), Err(CurveError::Overflow));
        assert_eq!(curve.price(0, u128::MAX), Err(CurveError::Overflow));
        assert_eq!(curve.price(1, u128::MAX), Err(CurveError::Overflow));
    }

    #[test]
    fn test_rejects_flat_parameters() {
        assert!(FloorCurve::new(99, 10_000).is_err());
        assert!(FloorCurve::new(1_000, 1).is_err());
        // exactly B * (B - 1) is the smallest accepted numerator
        assert!(FloorCurve::new(10_000 * 9_999, 10_000).is_ok());
    }
}
