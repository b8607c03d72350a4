//! Numeric helpers for byte counts and rounded report values.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serializer};

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Byte count that also accepts integral floats such as `1234.0`.
///
/// Older snapshot writers summed sizes as floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LenientBytes(pub u64);

impl<'de> Deserialize<'de> for LenientBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = LenientBytes;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative integral byte count")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(LenientBytes(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(LenientBytes)
                    .map_err(|_| E::custom(format!("negative byte count {}", v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
                    Ok(LenientBytes(v as u64))
                } else {
                    Err(E::custom(format!("invalid byte count {}", v)))
                }
            }
        }

        deserializer.deserialize_any(BytesVisitor)
    }
}

/// `deserialize_with` adapter for a required byte count.
pub fn de_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    LenientBytes::deserialize(deserializer).map(|b| b.0)
}

/// `deserialize_with` adapter for an optional byte count.
pub fn de_opt_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Option::<LenientBytes>::deserialize(deserializer).map(|b| b.map(|b| b.0))
}

/// `deserialize_with` adapter for an optional name → byte count mapping.
pub fn de_opt_bytes_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, u64>>, D::Error> {
    let map = Option::<BTreeMap<String, LenientBytes>>::deserialize(deserializer)?;
    Ok(map.map(|m| m.into_iter().map(|(k, v)| (k, v.0)).collect()))
}

/// `serialize_with` adapter writing a value rounded to two decimals.
pub fn ser_round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

/// `serialize_with` adapter for optional rounded values.
pub fn ser_opt_round2<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round2(*v)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.66666), 66.67);
        assert_eq!(round2(33.333), 33.33);
        assert_eq!(round2(4.0), 4.0);
    }

    #[test]
    fn test_lenient_bytes_accepts_integral_float() {
        let b: LenientBytes = serde_json::from_str("1234.0").unwrap();
        assert_eq!(b, LenientBytes(1234));
        let b: LenientBytes = serde_json::from_str("42").unwrap();
        assert_eq!(b, LenientBytes(42));
    }

    #[test]
    fn test_lenient_bytes_rejects_bad_values() {
        assert!(serde_json::from_str::<LenientBytes>("-1").is_err());
        assert!(serde_json::from_str::<LenientBytes>("12.5").is_err());
        assert!(serde_json::from_str::<LenientBytes>("\"12\"").is_err());
    }
}
