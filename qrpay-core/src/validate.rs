//! Intent validation
//!
//! A decoded payload is untrusted input. Before it may move funds it is checked
//! against the local token registry, so a forged or stale QR code cannot pair one
//! token's contract with another token's decimals.

use std::str::FromStr;

use ethers_core::types::{Address, U256};
use ethers_core::utils::to_checksum;
use tracing::debug;

use crate::amount::to_positive_base_units;
use crate::intent::PaymentIntent;
use crate::token::{TokenDescriptor, TokenKind, TokenRegistry};
use crate::ValidationError;

/// A fully validated transfer, ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub token: TokenDescriptor,
    pub recipient: Address,
    pub amount_base_units: U256,
}

/// Parse a `0x`-prefixed 20-byte hex address.
///
/// Mixed-case input must carry a valid EIP-55 checksum. The zero address is
/// refused since anything sent there is burned.
pub fn parse_recipient(input: &str) -> Result<Address, ValidationError> {
    let input = input.trim();
    let invalid = |why: &str| ValidationError::InvalidRecipient(format!("{input}: {why}"));

    let hex = input
        .strip_prefix("0x")
        .ok_or_else(|| invalid("missing 0x prefix"))?;
    if hex.len() != 40 {
        return Err(invalid("expected 40 hex digits"));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("not hexadecimal"));
    }

    let address = Address::from_str(hex).map_err(|_| invalid("not hexadecimal"))?;

    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    if has_upper && has_lower && to_checksum(&address, None) != input {
        return Err(invalid("checksum mismatch"));
    }

    if address.is_zero() {
        return Err(invalid("zero address"));
    }

    Ok(address)
}

fn token_address_matches(token: &TokenDescriptor, claimed: &str) -> bool {
    let claimed = claimed.trim();
    match token.kind {
        TokenKind::Native => {
            claimed.is_empty()
                || Address::from_str(claimed).map_or(false, |address| address.is_zero())
        }
        TokenKind::Contract(expected) => {
            Address::from_str(claimed).map_or(false, |address| address == expected)
        }
    }
}

/// Check a decoded intent and derive the transfer it asks for.
///
/// Checks run in order and stop at the first failure: token known, token details
/// agree with the registry, recipient well-formed, amount positive and exact.
pub fn validate(
    intent: &PaymentIntent,
    registry: &TokenRegistry,
) -> Result<TransferRequest, ValidationError> {
    let token = registry
        .get(&intent.token_symbol)
        .ok_or_else(|| ValidationError::UnsupportedToken(intent.token_symbol.clone()))?;

    if token.decimals != intent.token_decimals {
        return Err(ValidationError::TokenMismatch {
            symbol: token.symbol.clone(),
            detail: format!(
                "request says {} decimals, registry says {}",
                intent.token_decimals, token.decimals
            ),
        });
    }
    if !token_address_matches(token, &intent.token_address) {
        return Err(ValidationError::TokenMismatch {
            symbol: token.symbol.clone(),
            detail: format!(
                "request says address {}, registry says {}",
                intent.token_address,
                token.wire_address_hex()
            ),
        });
    }

    let recipient = parse_recipient(&intent.recipient_address)?;
    let amount_base_units = to_positive_base_units(&intent.amount, token.decimals)?;

    debug!(
        "Validated request for {} {} ({} base units) to {:#x}",
        intent.amount, token.symbol, amount_base_units, recipient
    );

    Ok(TransferRequest {
        token: token.clone(),
        recipient,
        amount_base_units,
    })
}

/// Validate a manually entered payment (send form)
pub fn validate_form(
    token_symbol: &str,
    recipient: &str,
    amount: &str,
    registry: &TokenRegistry,
) -> Result<TransferRequest, ValidationError> {
    let token = registry
        .get(token_symbol)
        .ok_or_else(|| ValidationError::UnsupportedToken(token_symbol.to_string()))?;
    let recipient = parse_recipient(recipient)?;
    let amount_base_units = to_positive_base_units(amount, token.decimals)?;

    Ok(TransferRequest {
        token: token.clone(),
        recipient,
        amount_base_units,
    })
}
