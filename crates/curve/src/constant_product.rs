//! Constant-product curve over virtual reserves
//!
//! The market behaves as an `x * y = k` pool seeded with a virtual token
//! reserve `T₀` and a virtual pay reserve `P₀`. Buying `d` tokens at supply
//! `s` takes the token side from `T₀ - s` to `T₀ - s - d`, so the pay side must
//! grow to `k / (T₀ - s - d)`:
//!
//! ```text
//! F(s) = ⌈k / (T₀ - s)⌉,   k = T₀ · P₀
//! ```
//!
//! Rounding up keeps the pool never under-collateralised.

use crate::errors::*;
use crate::{ensure_strictly_increasing, Curve};
use bondfi_types::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProductCurve {
    virtual_token_reserve: Amount,
    virtual_pay_reserve: Amount,
    invariant: Amount,
}

impl ConstantProductCurve {
    pub fn new(virtual_token_reserve: Amount, virtual_pay_reserve: Amount) -> Result<Self> {
        if virtual_token_reserve < 2 {
            return Err(CurveError::InvalidParameters(
                "virtual token reserve must be at least 2",
            ));
        }
        let invariant = virtual_token_reserve
            .checked_mul(virtual_pay_reserve)
            .ok_or(CurveError::InvalidParameters("reserve product overflows"))?;
        ensure_strictly_increasing(invariant, virtual_token_reserve)?;

        Ok(Self {
            virtual_token_reserve,
            virtual_pay_reserve,
            invariant,
        })
    }

    pub fn virtual_token_reserve(&self) -> Amount {
        self.virtual_token_reserve
    }

    pub fn virtual_pay_reserve(&self) -> Amount {
        self.virtual_pay_reserve
    }

    /// `k = T₀ · P₀`
    pub fn invariant(&self) -> Amount {
        self.invariant
    }
}

impl Curve for ConstantProductCurve {
    fn name(&self) -> &'static str {
        "constant_product"
    }

    fn potential(&self, supply: Amount) -> Result<Amount> {
        let token_side = self
            .virtual_token_reserve
            .checked_sub(supply)
            .ok_or(CurveError::Overflow)?;
        if token_side == 0 {
            return Err(CurveError::DivisionByZero);
        }
        Ok(self.invariant.div_ceil(token_side))
    }

    fn max_supply(&self) -> Amount {
        self.virtual_token_reserve - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ConstantProductCurve {
        // T0 = 1000, P0 = 3000, k = 3_000_000
        ConstantProductCurve::new(1_000, 3_000).unwrap()
    }

    #[test]
    fn test_potential_at_zero_is_virtual_pay_reserve() {
        let curve = pool();
        assert_eq!(curve.invariant(), 3_000_000);
        assert_eq!(curve.potential(0).unwrap(), 3_000);
    }

    #[test]
    fn test_buy_half_the_pool_doubles_reserve() {
        let curve = pool();
        // token side 1000 -> 500, pay side 3000 -> 6000
        assert_eq!(curve.price(0, 500).unwrap(), 3_000);
    }

    #[test]
    fn test_rounds_up() {
        let curve = pool();
        // 3_000_000 / 999 = 3003.003.. -> 3004
        assert_eq!(curve.potential(1).unwrap(), 3_004);
        assert_eq!(curve.price(0, 1).unwrap(), 4);
    }

    #[test]
    fn test_additivity() {
        let curve = pool();
        let whole = curve.price(100, 700).unwrap();
        assert_eq!(
            curve.price(100, 333).unwrap() + curve.price(433, 367).unwrap(),
            whole
        );
    }

    #[test]
    fn test_boundary_fault_classes() {
        let curve = pool();
        assert_eq!(curve.max_supply(), 999);
        assert_eq!(curve.price(0, 999).unwrap(), 3_000_000 - 3_000);
        assert_eq!(curve.price(0, 1_000), Err(CurveError::DivisionByZero));
        assert_eq!(curve.price(500, 501), Err(CurveError::Overflow));
    }

    #[test]
    fn test_rejects_bad_reserves() {
        assert!(ConstantProductCurve::new(1, 10).is_err());
        assert!(ConstantProductCurve::new(u128::MAX, 2).is_err());
        assert!(ConstantProductCurve::new(1_000, 998).is_err());
        assert!(ConstantProductCurve::new(1_000, 999).is_ok());
    }
}
