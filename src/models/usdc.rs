use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// USDC carries six decimal places on-chain; one base unit is a millionth
// of a dollar. All amount handling is integer-only -- no f64 anywhere in
// the payment pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Usdc(u64);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("amount '{0}' has no numeric content")]
    Empty(String),
    #[error("amount '{0}' is not a valid decimal")]
    Malformed(String),
    #[error("amount '{0}' overflows the USDC range")]
    Overflow(String),
}

impl Usdc {
    pub const DECIMALS: u32 = 6;
    const SCALE: u64 = 1_000_000;

    pub const ZERO: Usdc = Usdc(0);

    pub const fn from_base_units(units: u64) -> Self {
        Usdc(units)
    }

    pub fn base_units(self) -> u64 {
        self.0
    }

    // Integer-only decimal parsing: split on the point, scale each part
    // separately with checked arithmetic. Accepts "$0.001", "0.005", "1";
    // fractional digits beyond six are truncated.
    pub fn parse(input: &str) -> Result<Self, ParseAmountError> {
        if input.trim_start().starts_with('-') {
            return Err(ParseAmountError::Malformed(input.to_string()));
        }

        let cleaned: String = input
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if cleaned.is_empty() {
            return Err(ParseAmountError::Empty(input.to_string()));
        }

        let malformed = || ParseAmountError::Malformed(input.to_string());
        let overflow = || ParseAmountError::Overflow(input.to_string());

        let units = match cleaned.split_once('.') {
            Some((int_part, frac_part)) => {
                let integer: u64 = if int_part.is_empty() {
                    0
                } else {
                    int_part.parse().map_err(|_| malformed())?
                };

                let decimals = Self::DECIMALS as usize;
                let frac_str = if frac_part.len() >= decimals {
                    &frac_part[..decimals]
                } else {
                    frac_part
                };
                let fraction: u64 = if frac_str.is_empty() {
                    0
                } else {
                    frac_str.parse().map_err(|_| malformed())?
                };
                let scale = 10u64.pow((decimals - frac_str.len()) as u32);

                integer
                    .checked_mul(Self::SCALE)
                    .and_then(|i| fraction.checked_mul(scale).map(|f| (i, f)))
                    .and_then(|(i, f)| i.checked_add(f))
                    .ok_or_else(overflow)?
            }
            None => {
                let integer: u64 = cleaned.parse().map_err(|_| malformed())?;
                integer.checked_mul(Self::SCALE).ok_or_else(overflow)?
            }
        };

        Ok(Usdc(units))
    }
}

impl fmt::Display for Usdc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{frac:06}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

impl FromStr for Usdc {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Usdc::parse(s)
    }
}

impl Serialize for Usdc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Usdc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> de::Visitor<'de> for AmountVisitor {
            type Value = Usdc;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal USDC amount as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Usdc, E> {
                Usdc::parse(v).map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Usdc, E> {
                if !v.is_finite() || v < 0.0 {
                    return Err(E::custom("amount must be a non-negative number"));
                }
                // Shortest round-trip formatting hands the integer parser the
                // exact literal the caller wrote: 0.005 arrives as "0.005".
                Usdc::parse(&v.to_string()).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Usdc, E> {
                v.checked_mul(Usdc::SCALE)
                    .map(Usdc)
                    .ok_or_else(|| E::custom("amount overflows the USDC range"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Usdc, E> {
                let v = u64::try_from(v)
                    .map_err(|_| E::custom("amount must be a non-negative number"))?;
                de::Visitor::visit_u64(AmountVisitor, v)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
