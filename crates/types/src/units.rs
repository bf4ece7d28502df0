//! Canonical units for the Bondfi market.
//!
//! ## Units
//! - Topic tokens are counted in micro-tokens: 1 token = 1,000,000 units
//! - Pay-asset amounts are raw integer units of whatever asset the app settles in
//! - Fee rates are basis points out of 100,000 (not 10,000)
//! - NO floating point anywhere in pricing or fee computation

/// Raw integer amount (topic tokens or pay asset).
pub type Amount = u128;

/// Number of decimals carried by topic tokens.
pub const TOKEN_DECIMALS: u32 = 6;

/// One whole topic token in raw units.
pub const TOKEN_UNIT: Amount = 10u128.pow(TOKEN_DECIMALS);

/// Denominator for every fee rate and NFT owner percentage.
pub const BPS_DENOMINATOR: u32 = 100_000;

/// `amount * bps / 100_000`, floored.
///
/// Splits `amount` into quotient and remainder of the denominator so the
/// result is exact without forming `amount * bps`. Never overflows for
/// `bps <= 100_000`.
#[inline]
pub fn apply_bps(amount: Amount, bps: u32) -> Option<Amount> {
    let denom = BPS_DENOMINATOR as u128;
    let bps = bps as u128;
    let whole = (amount / denom).checked_mul(bps)?;
    let part = (amount % denom) * bps / denom;
    whole.checked_add(part)
}

/// Convert whole tokens into raw units (saturating).
#[inline]
pub const fn tokens(whole: u128) -> Amount {
    whole.saturating_mul(TOKEN_UNIT)
}

/// Serialise `u128` as a decimal string; accept either a string or an integer
/// on input. TOML and most config sources cannot carry integers above `i64`.
pub mod amount_str {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = u128;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an unsigned integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                u128::try_from(v).map_err(|_| E::custom("amount must not be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.trim()
                    .replace('_', "")
                    .parse::<u128>()
                    .map_err(|e| E::custom(format!("invalid amount {v:?}: {e}")))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_conversions() {
        assert_eq!(tokens(1), TOKEN_UNIT);
        assert_eq!(tokens(1000), 1_000_000_000);
        assert_eq!(tokens(u128::MAX), u128::MAX);
    }

    #[test]
    fn test_apply_bps_floors() {
        assert_eq!(apply_bps(100_000, 1_000), Some(1_000));
        assert_eq!(apply_bps(99_999, 1_000), Some(999));
        assert_eq!(apply_bps(12345, 0), Some(0));
        assert_eq!(apply_bps(u128::MAX, 100_000), Some(u128::MAX));
        assert_eq!(apply_bps(u128::MAX, 200_000), None);
        assert_eq!(
            apply_bps(10u128.pow(37) + 12_345, 1_000),
            Some(10u128.pow(35) + 123)
        );
    }

    #[test]
    fn test_amount_str_accepts_both_forms() {
        #[derive(serde::Deserialize, serde::Serialize)]
        struct Wrapper {
            #[serde(with = "amount_str")]
            value: u128,
        }

        let from_str: Wrapper = serde_json::from_str(r#"{"value":"1000000000000000000000000000000000000"}"#).unwrap();
        assert_eq!(from_str.value, 10u128.pow(36));

        let from_int: Wrapper = serde_json::from_str(r#"{"value":42}"#).unwrap();
        assert_eq!(from_int.value, 42);

        let underscored: Wrapper = serde_json::from_str(r#"{"value":"21_000_000"}"#).unwrap();
        assert_eq!(underscored.value, 21_000_000);

        let json = serde_json::to_string(&from_int).unwrap();
        assert_eq!(json, r#"{"value":"42"}"#);
    }
}
