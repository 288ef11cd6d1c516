//! Amount conversion between satoshis and the BCH display denomination.
//!
//! All conversions work on decimal strings. The BCH form is never routed
//! through floating point: the fractional part is padded or truncated to
//! exactly eight digits and the result is parsed as one integer, so values
//! like `0.1` convert losslessly.

use std::fmt;

/// Number of satoshis in one BCH.
pub const SATS_PER_BCH: u64 = 100_000_000;

/// Denomination used for user-facing amount strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountUnit {
    /// Whole-coin display denomination ("0.0001").
    Bch,
    /// Base-unit satoshis ("10000").
    Sats,
}

impl fmt::Display for AmountUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bch => write!(f, "BCH"),
            Self::Sats => write!(f, "SATS"),
        }
    }
}

/// Parse an amount string into satoshis.
///
/// Unparsable input yields 0. Callers must treat 0 as "no valid amount",
/// never as a legitimate zero-value request.
pub fn to_sats(amount: &str, unit: AmountUnit) -> u64 {
    let amount = amount.trim();
    if amount.is_empty() {
        return 0;
    }
    match unit {
        AmountUnit::Bch => {
            let mut parts = amount.splitn(2, '.');
            let whole = match parts.next() {
                Some("") | None => "0",
                Some(w) => w,
            };
            let mut fraction = parts.next().unwrap_or("").to_string();
            // Exactly eight fractional digits: pad short, truncate long.
            while fraction.len() < 8 {
                fraction.push('0');
            }
            fraction.truncate(8);
            let digits = format!("{}{}", whole, fraction);
            digits.parse::<u64>().unwrap_or(0)
        }
        AmountUnit::Sats => {
            // Truncate toward zero: "12.9" counts as 12 sats.
            let integral = amount.splitn(2, '.').next().unwrap_or("");
            integral.parse::<u64>().unwrap_or(0)
        }
    }
}

/// Format satoshis as an amount string in the requested denomination.
///
/// BCH output strips trailing zeros and omits the decimal point entirely
/// when the fraction is empty, so `from_sats(to_sats(s, Bch), Bch)`
/// reproduces `s` without trailing-zero artifacts.
pub fn from_sats(sats: u64, unit: AmountUnit) -> String {
    match unit {
        AmountUnit::Bch => {
            let digits = format!("{:09}", sats);
            let split = digits.len() - 8;
            let whole = &digits[..split];
            let fraction = digits[split..].trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        AmountUnit::Sats => sats.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bch_strings_convert_without_float_drift() {
        assert_eq!(to_sats("0.0001", AmountUnit::Bch), 10_000);
        assert_eq!(to_sats("1", AmountUnit::Bch), SATS_PER_BCH);
        assert_eq!(to_sats("21.5", AmountUnit::Bch), 2_150_000_000);
        // 0.1 is the classic binary-float trap
        assert_eq!(to_sats("0.1", AmountUnit::Bch), 10_000_000);
        assert_eq!(to_sats(".5", AmountUnit::Bch), 50_000_000);
    }

    #[test]
    fn long_fractions_truncate_to_eight_digits() {
        assert_eq!(to_sats("0.123456789", AmountUnit::Bch), 12_345_678);
    }

    #[test]
    fn sats_parse_truncates_toward_zero() {
        assert_eq!(to_sats("10000", AmountUnit::Sats), 10_000);
        assert_eq!(to_sats("12.9", AmountUnit::Sats), 12);
    }

    #[test]
    fn unparsable_input_is_zero() {
        assert_eq!(to_sats("", AmountUnit::Bch), 0);
        assert_eq!(to_sats("abc", AmountUnit::Bch), 0);
        assert_eq!(to_sats("1,5", AmountUnit::Bch), 0);
        assert_eq!(to_sats("-3", AmountUnit::Sats), 0);
    }

    #[test]
    fn display_formatting_strips_trailing_zeros() {
        assert_eq!(from_sats(10_000, AmountUnit::Bch), "0.0001");
        assert_eq!(from_sats(SATS_PER_BCH, AmountUnit::Bch), "1");
        assert_eq!(from_sats(0, AmountUnit::Bch), "0");
        assert_eq!(from_sats(150_000_000, AmountUnit::Bch), "1.5");
        assert_eq!(from_sats(546, AmountUnit::Sats), "546");
    }

    #[test]
    fn display_round_trip() {
        for sats in [1u64, 546, 10_000, 99_999_999, 100_000_001, 2_100_000_000_000_000] {
            let text = from_sats(sats, AmountUnit::Bch);
            assert_eq!(to_sats(&text, AmountUnit::Bch), sats, "via {:?}", text);
        }
    }
}
