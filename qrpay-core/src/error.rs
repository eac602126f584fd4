//! Error types for the payment request protocol

use ethers_core::types::U256;
use thiserror::Error;

/// An amount string could not be converted to base units
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Nothing but whitespace was entered
    #[error("Invalid amount: empty")]
    Empty,

    /// Leading minus sign
    #[error("Invalid amount: negative value {0}")]
    Negative(String),

    /// Anything that is not `digits[.digits]`
    #[error("Invalid amount: not a decimal number: {0}")]
    NotANumber(String),

    /// More fractional digits than the token can represent
    #[error("Invalid amount: {amount} has more than {decimals} decimal places")]
    ExcessPrecision { amount: String, decimals: u8 },

    /// The scaled value does not fit in 256 bits
    #[error("Invalid amount: {0} overflows 256-bit base units")]
    Overflow(String),

    /// 10^decimals itself does not fit in 256 bits
    #[error("Invalid amount: unsupported decimal precision {0}")]
    UnsupportedDecimals(u8),

    /// Amount must be strictly positive for a transfer
    #[error("Invalid amount: must be greater than zero")]
    Zero,
}

/// A scanned payload is not a payment request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not JSON, not an object, or a field is missing or mistyped
    #[error("Malformed payment request: {0}")]
    Malformed(String),

    /// Well-formed, but the `type` tag names something else
    #[error("Not a payment request: type {0}")]
    WrongKind(String),
}

impl DecodeError {
    /// Stable short reason code
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeError::Malformed(_) => "malformed",
            DecodeError::WrongKind(_) => "wrong-kind",
        }
    }

    /// Message shown to the user by the scanning flow
    pub fn user_message(&self) -> &'static str {
        "Invalid QR code format"
    }
}

/// Discriminant of [`ValidationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    UnsupportedToken,
    TokenMismatch,
    InvalidRecipient,
    InvalidAmount,
}

/// A decoded intent (or form entry) cannot become a transfer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),

    #[error("Token mismatch for {symbol}: {detail}")]
    TokenMismatch { symbol: String, detail: String },

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::UnsupportedToken(_) => ValidationErrorKind::UnsupportedToken,
            ValidationError::TokenMismatch { .. } => ValidationErrorKind::TokenMismatch,
            ValidationError::InvalidRecipient(_) => ValidationErrorKind::InvalidRecipient,
            ValidationError::InvalidAmount(_) => ValidationErrorKind::InvalidAmount,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ValidationError::UnsupportedToken(symbol) => format!("Unsupported token {symbol}"),
            ValidationError::TokenMismatch { symbol, .. } => {
                format!("Payment request for {symbol} does not match the known token")
            }
            ValidationError::InvalidRecipient(_) => "Recipient address is not valid".to_string(),
            ValidationError::InvalidAmount(_) => "Amount is not valid".to_string(),
        }
    }
}

/// Failure reported by a wallet signer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The account holder declined to sign
    #[error("Signature request rejected")]
    Rejected,

    /// The node refused the transaction for lack of funds
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Network or node failure
    #[error("Node error: {0}")]
    Node(String),
}

/// A transfer could not be submitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Transfer rejected by signer")]
    UserRejected,

    #[error("Transfer submission failed: {0}")]
    SubmissionFailed(String),

    /// `available` is known when the balance was read before submission
    #[error("Insufficient funds for a transfer of {needed} base units")]
    InsufficientFunds { needed: U256, available: Option<U256> },
}

impl DispatchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DispatchError::UserRejected => "Payment cancelled in wallet.",
            DispatchError::SubmissionFailed(_) => "Payment failed. Please try again.",
            DispatchError::InsufficientFunds { .. } => "Insufficient balance for this payment.",
        }
    }
}

/// The token registry is inconsistent
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate token symbol: {0}")]
    DuplicateSymbol(String),

    #[error("Empty token symbol")]
    EmptySymbol,

    #[error("Invalid contract address for {symbol}: {address}")]
    InvalidAddress { symbol: String, address: String },

    #[error("Token {symbol} has unsupported decimals {decimals}")]
    UnsupportedDecimals { symbol: String, decimals: u8 },

    #[error("Registry file error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The camera could not be used for scanning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),
}

/// Rendering a payload as a QR code failed
#[cfg(feature = "qrcode")]
#[derive(Debug, Error)]
pub enum QrError {
    /// Payload too long for any QR version
    #[error("QR generation failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid color {0}, expected #RRGGBB")]
    InvalidColor(String),
}

/// The held or supplied payment could not be completed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayError {
    #[error("No scanned payment request to pay")]
    NothingScanned,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl PayError {
    pub fn user_message(&self) -> String {
        match self {
            PayError::NothingScanned => "Scan a payment QR code first".to_string(),
            PayError::Invalid(e) => e.user_message(),
            PayError::Dispatch(e) => e.user_message().to_string(),
        }
    }
}
