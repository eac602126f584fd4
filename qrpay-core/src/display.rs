//! Presentation formatting for balances and history rows

use ethers_core::types::U256;

use crate::amount::from_base_units;

/// Format base units with at most `places` fractional digits, rounding half up.
///
/// Used for balances, which the wallet shows to six places. Trailing zeros are
/// trimmed and zero renders as `"0"`.
pub fn format_display(value: U256, decimals: u8, places: usize) -> String {
    let decimals_usize = decimals as usize;
    if places >= decimals_usize {
        return from_base_units(value, decimals);
    }

    let drop = decimals_usize - places;
    let divisor = U256::exp10(drop);
    let (mut kept, remainder) = value.div_mod(divisor);
    if remainder.saturating_mul(U256::from(2u8)) >= divisor {
        kept = kept.saturating_add(U256::one());
    }

    from_base_units(kept, places as u8)
}

/// Shorten an address to `0x1234...abcd`
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
