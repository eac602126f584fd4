//! Payment request payloads exchanged through QR codes
//!
//! ## Payload Format
//!
//! ```text
//! { "type": "payment_request", "amount": "<decimal string>", "token": "<symbol>",
//!   "tokenAddress": "<hex address or zero sentinel>", "tokenDecimals": <int>,
//!   "recipient": "<hex address>", "timestamp": <epoch millis> }
//! ```
//!
//! Decoding never panics: scanners hand us arbitrary text, and anything that is not
//! a payment request comes back as a [`DecodeError`] the UI can show as
//! "Invalid QR code format". Unknown extra fields are ignored.

use chrono::Utc;
use ethers_core::utils::to_checksum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::amount::{from_base_units, to_positive_base_units};
use crate::token::TokenDescriptor;
use crate::validate::parse_recipient;
use crate::{DecodeError, ValidationError, PAYMENT_REQUEST_KIND};

/// The `type` tag of a payload. Only payment requests exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentKind {
    #[serde(rename = "payment_request")]
    PaymentRequest,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::PaymentRequest => PAYMENT_REQUEST_KIND,
        }
    }
}

/// A receiver-authored request for a single transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    /// Decimal amount in whole tokens
    pub amount: String,
    #[serde(rename = "token")]
    pub token_symbol: String,
    /// Zero sentinel for the native asset
    #[serde(rename = "tokenAddress")]
    pub token_address: String,
    #[serde(rename = "tokenDecimals")]
    pub token_decimals: u8,
    #[serde(rename = "recipient")]
    pub recipient_address: String,
    #[serde(rename = "timestamp")]
    pub created_at_millis: u64,
}

impl PaymentIntent {
    /// Build a request for `amount` of `token` payable to `recipient`.
    ///
    /// The amount is stored in canonical form and must be positive; the recipient
    /// is stored with its EIP-55 checksum.
    pub fn request(
        token: &TokenDescriptor,
        amount: &str,
        recipient: &str,
        created_at_millis: u64,
    ) -> Result<Self, ValidationError> {
        let recipient = parse_recipient(recipient)?;
        let units = to_positive_base_units(amount, token.decimals)?;

        Ok(Self {
            kind: IntentKind::PaymentRequest,
            amount: from_base_units(units, token.decimals),
            token_symbol: token.symbol.clone(),
            token_address: token.wire_address_hex(),
            token_decimals: token.decimals,
            recipient_address: to_checksum(&recipient, None),
            created_at_millis,
        })
    }

    /// [`PaymentIntent::request`] stamped with the current time
    pub fn request_now(
        token: &TokenDescriptor,
        amount: &str,
        recipient: &str,
    ) -> Result<Self, ValidationError> {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        Self::request(token, amount, recipient, now)
    }

    /// One-line description, e.g. `5 USDC to 0xABCD...1234`
    pub fn summary(&self) -> String {
        format!(
            "{} {} to {}",
            self.amount,
            self.token_symbol,
            crate::display::short_address(&self.recipient_address)
        )
    }
}

/// Serialize an intent to the QR payload text
pub fn encode(intent: &PaymentIntent) -> String {
    json!({
        "type": intent.kind.as_str(),
        "amount": intent.amount,
        "token": intent.token_symbol,
        "tokenAddress": intent.token_address,
        "tokenDecimals": intent.token_decimals,
        "recipient": intent.recipient_address,
        "timestamp": intent.created_at_millis,
    })
    .to_string()
}

/// Parse QR payload text into an intent
pub fn decode(payload: &str) -> Result<PaymentIntent, DecodeError> {
    let value: Value = serde_json::from_str(payload.trim())
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::Malformed("expected a JSON object".to_string()))?;

    match object.get("type") {
        None => return Err(DecodeError::Malformed("missing type".to_string())),
        Some(Value::String(kind)) if kind == PAYMENT_REQUEST_KIND => {}
        Some(other) => return Err(DecodeError::WrongKind(other.to_string())),
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenRegistry;
    use proptest::prelude::*;

    const RECIPIENT: &str = "0xabcdef0123456789abcdef0123456789abcd1234";

    fn sample_intent() -> PaymentIntent {
        let registry = TokenRegistry::kaia_mainnet();
        PaymentIntent::request(registry.get("USDC").unwrap(), "5", RECIPIENT, 1_718_000_000_000)
            .unwrap()
    }

    #[test]
    fn test_request_fields() {
        let intent = sample_intent();
        assert_eq!(intent.kind, IntentKind::PaymentRequest);
        assert_eq!(intent.amount, "5");
        assert_eq!(intent.token_symbol, "USDC");
        assert_eq!(intent.token_address, "0xe2053bcf56d2030d2470fb454574237cf9ee3d4b");
        assert_eq!(intent.token_decimals, 6);
        assert_eq!(intent.recipient_address.to_lowercase(), RECIPIENT);
        assert_eq!(intent.created_at_millis, 1_718_000_000_000);
    }

    #[test]
    fn test_request_canonicalizes_amount() {
        let registry = TokenRegistry::kaia_mainnet();
        let kai = registry.get("KAI").unwrap();
        let intent = PaymentIntent::request(kai, "0010.50", RECIPIENT, 0).unwrap();
        assert_eq!(intent.amount, "10.5");
        assert_eq!(intent.token_address, format!("0x{}", "0".repeat(40)));
    }

    #[test]
    fn test_request_rejects_bad_input() {
        let registry = TokenRegistry::kaia_mainnet();
        let usdc = registry.get("USDC").unwrap();
        assert!(PaymentIntent::request(usdc, "0", RECIPIENT, 0).is_err());
        assert!(PaymentIntent::request(usdc, "", RECIPIENT, 0).is_err());
        assert!(PaymentIntent::request(usdc, "1", "0x1234", 0).is_err());
    }

    #[test]
    fn test_encode_wire_format() {
        let payload = encode(&sample_intent());
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["type"], "payment_request");
        assert_eq!(value["amount"], "5");
        assert_eq!(value["token"], "USDC");
        assert_eq!(value["tokenDecimals"], 6);
        assert_eq!(value["timestamp"], 1_718_000_000_000u64);
        assert!(value["recipient"].is_string());
    }

    #[test]
    fn test_decode_external_payload() {
        let payload = r#"{"type":"payment_request","amount":"12.5","token":"USDT",
            "tokenAddress":"0xd077a400968890eacc75cdc901f0356c943e4fdb","tokenDecimals":6,
            "recipient":"0xabcdef0123456789abcdef0123456789abcd1234","timestamp":1718000000000,
            "memo":"ignored"}"#;
        let intent = decode(payload).unwrap();
        assert_eq!(intent.amount, "12.5");
        assert_eq!(intent.token_symbol, "USDT");
    }

    #[test]
    fn test_decode_malformed() {
        for payload in [
            "not json",
            "",
            "[]",
            "42",
            r#"{"amount":"1"}"#,
            r#"{"type":"payment_request"}"#,
            r#"{"type":"payment_request","amount":5,"token":"USDC","tokenAddress":"0x0","tokenDecimals":6,"recipient":"0x0","timestamp":0}"#,
            r#"{"type":"payment_request","amount":"5","token":"USDC","tokenAddress":"0x0","tokenDecimals":-1,"recipient":"0x0","timestamp":0}"#,
        ] {
            let err = decode(payload).unwrap_err();
            assert_eq!(err.reason(), "malformed", "{payload}");
        }
    }

    #[test]
    fn test_decode_wrong_kind() {
        let err = decode(r#"{"type":"invoice","amount":"1"}"#).unwrap_err();
        assert_eq!(err.reason(), "wrong-kind");
        let err = decode(r#"{"type":7}"#).unwrap_err();
        assert_eq!(err.reason(), "wrong-kind");
    }

    #[test]
    fn test_decode_deeply_nested_garbage() {
        let payload = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
        assert_eq!(decode(&payload).unwrap_err().reason(), "malformed");
    }

    #[test]
    fn test_summary() {
        assert_eq!(sample_intent().summary(), "5 USDC to 0xABcD...1234");
    }

    proptest! {
        #[test]
        fn prop_encode_decode_round_trip(
            amount in "[0-9]{1,20}(\\.[0-9]{1,6})?",
            symbol in "[A-Z]{2,8}",
            address in "0x[0-9a-f]{40}",
            decimals in any::<u8>(),
            recipient in "0x[0-9a-fA-F]{40}",
            ts in any::<u64>(),
        ) {
            let intent = PaymentIntent {
                kind: IntentKind::PaymentRequest,
                amount,
                token_symbol: symbol,
                token_address: address,
                token_decimals: decimals,
                recipient_address: recipient,
                created_at_millis: ts,
            };
            prop_assert_eq!(decode(&encode(&intent)).unwrap(), intent);
        }

        #[test]
        fn prop_decode_never_panics(payload in ".*") {
            let _ = decode(&payload);
        }
    }
}
