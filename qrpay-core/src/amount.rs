//! Decimal amount <-> integer base unit conversion
//!
//! Amounts typed by users (or carried in payment requests) are decimal strings.
//! On chain every token amount is an integer number of base units, `value * 10^decimals`.
//! The conversion here works on the digit string directly and never goes through a
//! float, so 18-decimal amounts far above 2^53 survive exactly.
//!
//! Input with more fractional digits than the token supports is rejected: a
//! request for `0.0000001` of a 6-decimal token is an error, not `0`.

use ethers_core::types::U256;

use crate::AmountError;

/// Largest precision whose scale factor (10^77) still fits in a U256
pub const MAX_DECIMALS: u8 = 77;

/// Convert a decimal amount string to base units
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }

    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }
    if amount.starts_with('-') {
        return Err(AmountError::Negative(amount.to_string()));
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };

    // Also rejects '+', exponents, a second '.', and inner whitespace
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) || (whole.is_empty() && frac.is_empty()) {
        return Err(AmountError::NotANumber(amount.to_string()));
    }

    if frac.len() > decimals as usize {
        return Err(AmountError::ExcessPrecision {
            amount: amount.to_string(),
            decimals,
        });
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole.trim_start_matches('0'));
    digits.push_str(frac);
    for _ in frac.len()..decimals as usize {
        digits.push('0');
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(digits).map_err(|_| AmountError::Overflow(amount.to_string()))
}

/// Render base units as the canonical decimal string
///
/// No leading zeros in the whole part, no trailing zeros in the fraction, and
/// no decimal point when the fraction is zero.
pub fn from_base_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{:0>width$}", digits, width = decimals + 1)
    } else {
        digits
    };

    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Normalise an amount string, e.g. `"010.500"` -> `"10.5"`
pub fn canonicalize(amount: &str, decimals: u8) -> Result<String, AmountError> {
    to_base_units(amount, decimals).map(|units| from_base_units(units, decimals))
}

/// Convert and require a strictly positive result
pub fn to_positive_base_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let units = to_base_units(amount, decimals)?;
    if units.is_zero() {
        return Err(AmountError::Zero);
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_amount_parsing() {
        assert_eq!(to_base_units("1", 6).unwrap(), U256::from(1_000_000u64));
        assert_eq!(to_base_units("1.0", 6).unwrap(), U256::from(1_000_000u64));
        assert_eq!(to_base_units("10.5", 6).unwrap(), U256::from(10_500_000u64));
        assert_eq!(to_base_units("0.000001", 6).unwrap(), U256::one());
        assert_eq!(to_base_units(".5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(to_base_units("5.", 6).unwrap(), U256::from(5_000_000u64));
        assert_eq!(to_base_units(" 2 ", 0).unwrap(), U256::from(2u64));
        assert_eq!(to_base_units("0", 18).unwrap(), U256::zero());
    }

    #[test]
    fn test_excess_precision_rejected() {
        assert_eq!(
            to_base_units("0.0000001", 6),
            Err(AmountError::ExcessPrecision {
                amount: "0.0000001".to_string(),
                decimals: 6
            })
        );
        assert!(to_base_units("1.5", 0).is_err());
        // Trailing zeros still count as digits the token cannot hold
        assert!(to_base_units("1.0000000", 6).is_err());
    }

    #[test]
    fn test_invalid_input_rejected() {
        assert_eq!(to_base_units("", 6), Err(AmountError::Empty));
        assert_eq!(to_base_units("   ", 6), Err(AmountError::Empty));
        assert!(matches!(to_base_units("-1", 6), Err(AmountError::Negative(_))));
        for bad in ["abc", "1e6", "+1", "1.2.3", ".", "1 000", "0x10", "1,5", "NaN", "∞"] {
            assert!(
                matches!(to_base_units(bad, 6), Err(AmountError::NotANumber(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_large_amounts_are_exact() {
        // 123456789.123456789123456789 KAI, well above 2^53 base units
        let units = to_base_units("123456789.123456789123456789", 18).unwrap();
        assert_eq!(units, U256::from_dec_str("123456789123456789123456789").unwrap());
        assert_eq!(from_base_units(units, 18), "123456789.123456789123456789");

        let max = U256::MAX.to_string();
        assert_eq!(to_base_units(&max, 0).unwrap(), U256::MAX);
        assert!(matches!(to_base_units(&max, 1), Err(AmountError::Overflow(_))));
    }

    #[test]
    fn test_unsupported_decimals() {
        assert_eq!(to_base_units("1", 78), Err(AmountError::UnsupportedDecimals(78)));
        assert_eq!(to_base_units("1", 77).unwrap(), U256::exp10(77));
    }

    #[test]
    fn test_amount_formatting() {
        assert_eq!(from_base_units(U256::from(1_000_000u64), 6), "1");
        assert_eq!(from_base_units(U256::from(10_500_000u64), 6), "10.5");
        assert_eq!(from_base_units(U256::one(), 6), "0.000001");
        assert_eq!(from_base_units(U256::zero(), 6), "0");
        assert_eq!(from_base_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("010.500", 6).unwrap(), "10.5");
        assert_eq!(canonicalize("0.0", 6).unwrap(), "0");
        assert_eq!(canonicalize(".25", 2).unwrap(), "0.25");
    }

    #[test]
    fn test_positive_amount() {
        assert_eq!(to_positive_base_units("0", 6), Err(AmountError::Zero));
        assert_eq!(to_positive_base_units("0.000", 6), Err(AmountError::Zero));
        assert!(to_positive_base_units("0.000001", 6).is_ok());
    }

    fn decimal_amount() -> impl Strategy<Value = (String, u8)> {
        (0u8..=18).prop_flat_map(|decimals| {
            let frac = if decimals == 0 {
                Just(String::new()).boxed()
            } else {
                proptest::string::string_regex(&format!("(\\.[0-9]{{0,{decimals}}})?"))
                    .unwrap()
                    .boxed()
            };
            ("[0-9]{1,30}", frac).prop_map(move |(whole, frac)| (format!("{whole}{frac}"), decimals))
        })
    }

    proptest! {
        #[test]
        fn prop_round_trip((amount, decimals) in decimal_amount()) {
            let units = to_base_units(&amount, decimals).unwrap();
            let rendered = from_base_units(units, decimals);
            // Rendering is already canonical and converts back to the same units
            prop_assert_eq!(canonicalize(&rendered, decimals).unwrap(), rendered.clone());
            prop_assert_eq!(to_base_units(&rendered, decimals).unwrap(), units);
        }

        #[test]
        fn prop_inverse_of_from_base_units(raw in any::<u128>(), decimals in 0u8..=18) {
            let value = U256::from(raw);
            prop_assert_eq!(to_base_units(&from_base_units(value, decimals), decimals).unwrap(), value);
        }
    }
}
