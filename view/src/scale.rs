//! Fixed-point scaling of decoded view values.

use std::fmt;

/// Denominator of NAD-scaled values (prices, per-token borrowing power).
pub const NAD: f64 = 1_000_000_000.0;
/// Basis points are reported as percentages: 10_000 bps is 100.
pub const BPS_PER_PERCENT: f64 = 100.0;
/// Denominator of plain token amounts.
pub const TOKEN_UNIT: f64 = 1_000_000.0;
/// The largest integer an f64 holds exactly, 2^53 - 1. Liquidation prices at
/// or above it are sentinels for an unsafe position.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub const NOT_APPLICABLE: &str = "Not applicable";
pub const IMMEDIATELY_UNSAFE: &str = "Immediately unsafe";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FormattedValue {
    Number(f64),
    Text(&'static str),
}

impl FormattedValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for FormattedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scale {
    Nad,
    Bps,
    Token,
    /// Token-scaled, with `0` and values from `MAX_SAFE_INTEGER` up mapped
    /// to text.
    LiquidationPrice,
    Unscaled,
}

impl Scale {
    pub fn apply(self, raw: &str) -> FormattedValue {
        let value = raw.parse::<f64>().unwrap_or(0.0);
        match self {
            Self::Nad => FormattedValue::Number(value / NAD),
            Self::Bps => FormattedValue::Number(value / BPS_PER_PERCENT),
            Self::Token => FormattedValue::Number(value / TOKEN_UNIT),
            Self::LiquidationPrice => {
                if value == 0.0 {
                    FormattedValue::Text(NOT_APPLICABLE)
                } else if value >= MAX_SAFE_INTEGER {
                    FormattedValue::Text(IMMEDIATELY_UNSAFE)
                } else {
                    FormattedValue::Number(value / TOKEN_UNIT)
                }
            }
            Self::Unscaled => FormattedValue::Number(value),
        }
    }
}

/// Chooses the scale of a decoded value from its label and its position in
/// the logged tuple (0 for single values).
pub trait ScalingPolicy {
    fn scale_for(&self, label: &str, position: usize) -> Scale;
}

/// The scaling table of the Omnipair view getters.
#[derive(Clone, Copy, Debug, Default)]
pub struct OmnipairScaling;

const NAD_LABELS: &[&str] = &[
    "emaPrice0Nad",
    "emaPrice1Nad",
    "spotPrice0Nad",
    "spotPrice1Nad",
    "userToken0BorrowingPower",
    "userToken1BorrowingPower",
];

// Second element is a bps integer that is reported as is.
const UNSCALED_SECOND: &[&str] = &["getBorrowLimitAndCfBpsForCollateral"];

impl ScalingPolicy for OmnipairScaling {
    fn scale_for(&self, label: &str, position: usize) -> Scale {
        let is = |names: &[&str]| names.iter().any(|name| name.eq_ignore_ascii_case(label));

        if position == 1 && is(UNSCALED_SECOND) {
            Scale::Unscaled
        } else if is(NAD_LABELS) {
            Scale::Nad
        } else if label.to_ascii_lowercase().ends_with("bps") {
            Scale::Bps
        } else if label.eq_ignore_ascii_case("userLiquidationPrice") {
            Scale::LiquidationPrice
        } else {
            Scale::Token
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omnipair_table() {
        let policy = OmnipairScaling;
        assert_eq!(policy.scale_for("emaPrice1Nad", 0), Scale::Nad);
        assert_eq!(policy.scale_for("userToken0BorrowingPower", 0), Scale::Nad);
        assert_eq!(policy.scale_for("userBorrowingPower", 0), Scale::Token);
        assert_eq!(policy.scale_for("userDebtUtilizationBps", 1), Scale::Bps);
        assert_eq!(
            policy.scale_for("userLiquidationPrice", 0),
            Scale::LiquidationPrice
        );
        assert_eq!(
            policy.scale_for("getBorrowLimitAndCfBpsForCollateral", 0),
            Scale::Token
        );
        assert_eq!(
            policy.scale_for("getBorrowLimitAndCfBpsForCollateral", 1),
            Scale::Unscaled
        );
        assert_eq!(policy.scale_for("k", 0), Scale::Token);
    }

    #[test]
    fn test_apply() {
        assert_eq!(Scale::Token.apply("1000000"), FormattedValue::Number(1.0));
        assert_eq!(Scale::Nad.apply("1000000000"), FormattedValue::Number(1.0));
        assert_eq!(Scale::Bps.apply("500"), FormattedValue::Number(5.0));
        assert_eq!(Scale::Unscaled.apply("8500"), FormattedValue::Number(8500.0));
    }

    #[test]
    fn test_liquidation_sentinels() {
        assert_eq!(
            Scale::LiquidationPrice.apply("0"),
            FormattedValue::Text(NOT_APPLICABLE)
        );
        assert_eq!(
            Scale::LiquidationPrice.apply(&u64::MAX.to_string()),
            FormattedValue::Text(IMMEDIATELY_UNSAFE)
        );
        assert_eq!(
            Scale::LiquidationPrice.apply("9007199254740991"),
            FormattedValue::Text(IMMEDIATELY_UNSAFE)
        );
        assert_eq!(
            Scale::LiquidationPrice.apply("9007199254740992"),
            FormattedValue::Text(IMMEDIATELY_UNSAFE)
        );
        assert_eq!(
            Scale::LiquidationPrice.apply("9007199254740990"),
            FormattedValue::Number(9_007_199_254_740_990.0 / TOKEN_UNIT)
        );
        assert_eq!(
            Scale::LiquidationPrice.apply("2500000"),
            FormattedValue::Number(2.5)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FormattedValue::Number(1.5).to_string(), "1.5");
        assert_eq!(FormattedValue::Text(NOT_APPLICABLE).to_string(), "Not applicable");
    }
}
