//! # qrpay-core: QR payment requests for EVM wallets
//!
//! This crate implements the payment request protocol used by the qrpay wallet:
//! a receiver describes the transfer they want as a [`PaymentIntent`], the intent
//! travels through a QR code as a small JSON document, and the payer decodes,
//! validates and submits it as exactly one on-chain transfer.
//!
//! ## Flow
//!
//! 1. **Request**: the receiver builds an intent with [`PaymentIntent::request`]
//!    and renders [`encode`]d text as a QR code
//! 2. **Scan**: the payer's camera yields the payload string ([`scan_payment`])
//! 3. **Decode**: [`decode`] turns text into a [`PaymentIntent`] or a typed [`DecodeError`]
//! 4. **Validate**: [`validate`] checks the intent against the [`TokenRegistry`]
//!    and produces a [`TransferRequest`] with exact base units
//! 5. **Dispatch**: [`dispatch`] submits one native or ERC-20 transfer through a
//!    [`WalletSigner`]
//!
//! ## Payload
//!
//! ```text
//! {"type":"payment_request","amount":"5","token":"USDC",
//!  "tokenAddress":"0xe2053bcf56d2030d2470fb454574237cf9ee3d4b","tokenDecimals":6,
//!  "recipient":"0x...","timestamp":1718000000000}
//! ```
//!
//! Amounts are always converted with integer arithmetic on [`U256`]; an amount
//! with more fractional digits than the token supports is rejected rather than
//! truncated.

pub mod amount;
pub mod controller;
pub mod dispatch;
pub mod display;
mod error;
pub mod history;
pub mod intent;
#[cfg(feature = "qrcode")]
pub mod qr;
pub mod refresh;
pub mod scan;
pub mod token;
pub mod validate;

pub use amount::{canonicalize, from_base_units, to_base_units};
pub use controller::{PaymentController, SubmitOutcome, Tab};
pub use dispatch::{dispatch, BusyFlag, BusyGuard, DispatchReceipt, WalletSigner};
pub use display::format_display;
pub use error::{
    AmountError, DecodeError, DispatchError, PayError, RegistryError, ScanError, SignerError,
    ValidationError, ValidationErrorKind,
};
#[cfg(feature = "qrcode")]
pub use error::QrError;
pub use history::{explorer_tx_url, summarize_transfers, Direction, HistoryEntry, TransferEvent};
pub use intent::{decode, encode, IntentKind, PaymentIntent};
pub use refresh::{RefreshSlot, RefreshTicket};
pub use scan::{scan_payment, Camera, ScanOutcome, ScanSession};
pub use token::{TokenDescriptor, TokenKind, TokenRegistry};
pub use validate::{parse_recipient, validate, validate_form, TransferRequest};

pub use ethers_core::types::{Address, TransactionRequest, H256, U256};

/// Kaia mainnet chain id
pub const KAIA_CHAIN_ID: u64 = 8217;

/// Public Kaia JSON-RPC endpoint
pub const KAIA_RPC_URL: &str = "https://public-en.node.kaia.io";

/// Block explorer prefix for transaction links
pub const KAIA_EXPLORER_TX_URL: &str = "https://scope.kaia.one/tx/";

/// Wire tag carried in the `type` field of every payment request payload
pub const PAYMENT_REQUEST_KIND: &str = "payment_request";

/// Number of fractional digits shown for balances
pub const DISPLAY_DECIMALS: usize = 6;

/// Maximum number of history rows kept for display
pub const HISTORY_LIMIT: usize = 10;
