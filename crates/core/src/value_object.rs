//! Value objects: immutable, compared by value.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A non-negative rupee amount with paise precision.
///
/// Stored as an integer number of paise so that arithmetic and comparisons
/// are exact. On the wire it is a decimal string (`"250.50"`); incoming
/// payloads may also carry a JSON number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    paise: u64,
}

impl Amount {
    pub const fn zero() -> Self {
        Self { paise: 0 }
    }

    pub const fn from_paise(paise: u64) -> Self {
        Self { paise }
    }

    pub fn from_rupees(rupees: u64) -> Self {
        Self {
            paise: rupees.saturating_mul(100),
        }
    }

    pub fn paise(&self) -> u64 {
        self.paise
    }

    pub fn is_zero(&self) -> bool {
        self.paise == 0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.paise / 100, self.paise % 100)
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DomainError::validation(format!("invalid amount: {s:?}"));

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let rupees: u64 = whole.parse().map_err(|_| invalid())?;
        let paise: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(paise))
            .map(Amount::from_paise)
            .ok_or_else(invalid)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(u64),
            Float(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Int(n) => Ok(Amount::from_rupees(n)),
            Raw::Float(f) if f.is_finite() && f >= 0.0 => {
                Ok(Amount::from_paise((f * 100.0).round() as u64))
            }
            Raw::Float(f) => Err(serde::de::Error::custom(format!("invalid amount: {f}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_whole_and_fractional_rupees() {
        assert_eq!("100".parse::<Amount>().unwrap(), Amount::from_rupees(100));
        assert_eq!("100.5".parse::<Amount>().unwrap(), Amount::from_paise(10_050));
        assert_eq!("0.07".parse::<Amount>().unwrap(), Amount::from_paise(7));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", "-5", "1.234", "abc", ".5", "1e3"] {
            assert!(bad.parse::<Amount>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn accepts_numbers_on_the_wire() {
        let a: Amount = serde_json::from_str("250").unwrap();
        let b: Amount = serde_json::from_str("\"250.00\"").unwrap();
        let c: Amount = serde_json::from_str("250.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"250.00\"");
    }

    proptest! {
        #[test]
        fn display_parses_back(paise in 0u64..10_000_000_000) {
            let amount = Amount::from_paise(paise);
            prop_assert_eq!(amount.to_string().parse::<Amount>().unwrap(), amount);
        }
    }
}
