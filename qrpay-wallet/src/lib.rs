//! qrpay-wallet
//!
//! Connects the payment protocol in `qrpay-core` to a real chain through ethers:
//! - [`EthersWallet`] implements [`qrpay_core::WalletSigner`] over a
//!   `SignerMiddleware<Provider<Http>, LocalWallet>`
//! - [`ChainReader`] serves balance, log and block queries without a key
//! - [`WalletConfig`] reads endpoints and keys from the environment

pub mod balances;
pub mod config;
pub mod history;
pub mod reader;
pub mod wallet;

pub use balances::{fetch_balances, refresh_balances, TokenBalance};
pub use config::WalletConfig;
pub use history::{fetch_history, refresh_history};
pub use reader::{parse_transfer_log, ChainReader};
pub use wallet::{classify_rpc_error, EthersClient, EthersWallet};
