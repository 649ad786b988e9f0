use crate::time::PositiveDuration;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A generalized cost, stored in centi-seconds.
///
/// Working in hundredths of a second allows reluctance ratios with two
/// decimals (e.g. 0.85) to be applied without floating point arithmetic.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Cost {
    centi_seconds: u64,
}

impl Cost {
    pub fn zero() -> Self {
        Self { centi_seconds: 0 }
    }

    pub const fn from_centi_seconds(centi_seconds: u64) -> Self {
        Self { centi_seconds }
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        Self {
            centi_seconds: seconds * 100,
        }
    }

    pub fn centi_seconds(&self) -> u64 {
        self.centi_seconds
    }
}

impl std::ops::Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            centi_seconds: self.centi_seconds.saturating_add(rhs.centi_seconds),
        }
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.centi_seconds / 100,
            self.centi_seconds % 100
        )
    }
}

/// A multiplicative factor with two decimals, e.g. a walk or wait reluctance.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Ratio {
    hundredths: u32,
}

impl Ratio {
    pub const fn one() -> Self {
        Self { hundredths: 100 }
    }

    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self { hundredths }
    }

    /// The cost of spending `duration`, weighted by this ratio.
    pub fn cost_of(&self, duration: &PositiveDuration) -> Cost {
        Cost {
            centi_seconds: duration.total_seconds().saturating_mul(u64::from(self.hundredths)),
        }
    }

    pub fn times(&self, cost: &Cost) -> Cost {
        Cost {
            centi_seconds: cost
                .centi_seconds
                .saturating_mul(u64::from(self.hundredths))
                / 100,
        }
    }
}

#[derive(Debug)]
pub struct ParseError {
    text: String,
    expected: &'static str,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` is not valid, expected `{}`", self.text, self.expected)
    }
}

impl std::error::Error for ParseError {}

impl Display for Ratio {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

impl FromStr for Ratio {
    type Err = ParseError;

    // accepts "2", "0.8" or "0.85"
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = || ParseError {
            text: text.to_string(),
            expected: "x.yz",
        };
        let mut fields = text.trim().split('.');
        let units: u32 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(error)?;
        let hundredths = match fields.next() {
            None => 0u32,
            Some(decimals) => {
                if decimals.is_empty() || decimals.len() > 2 || fields.next().is_some() {
                    return Err(error());
                }
                let parsed: u32 = decimals.parse().map_err(|_| error())?;
                if decimals.len() == 1 {
                    parsed * 10
                } else {
                    parsed
                }
            }
        };
        Ok(Ratio {
            hundredths: units * 100 + hundredths,
        })
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ratio::from_str(&text).map_err(serde::de::Error::custom)
    }
}

/// A linear function `f(x) = constant + coefficient * x` over costs.
///
/// Used to relax a cost limit : a candidate is kept as long as its cost does
/// not exceed `f(best_cost_so_far)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostLinearFunction {
    pub constant: Cost,
    pub coefficient: Ratio,
}

impl CostLinearFunction {
    pub fn identity() -> Self {
        Self {
            constant: Cost::zero(),
            coefficient: Ratio::one(),
        }
    }

    pub fn eval(&self, cost: &Cost) -> Cost {
        self.constant + self.coefficient.times(cost)
    }
}

impl Display for CostLinearFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} + {} t",
            self.constant.centi_seconds() / 100,
            self.coefficient
        )
    }
}

impl FromStr for CostLinearFunction {
    type Err = ParseError;

    // accepts "120 + 1.5 t" where the constant is in seconds
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = || ParseError {
            text: text.to_string(),
            expected: "seconds + ratio t",
        };
        let mut fields = text.split('+');
        let constant_seconds: u64 = fields
            .next()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(error)?;
        let coefficient_text = fields.next().ok_or_else(error)?;
        if fields.next().is_some() {
            return Err(error());
        }
        let coefficient_text = coefficient_text.trim().trim_end_matches('t').trim();
        let coefficient = Ratio::from_str(coefficient_text).map_err(|_| error())?;
        Ok(CostLinearFunction {
            constant: Cost::from_seconds(constant_seconds),
            coefficient,
        })
    }
}

impl serde::Serialize for CostLinearFunction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for CostLinearFunction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        CostLinearFunction::from_str(&text).map_err(serde::de::Error::custom)
    }
}
