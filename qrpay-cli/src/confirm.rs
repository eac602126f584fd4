//! Interactive confirmation in front of a signer.
//!
//! The local key signs anything it is handed, so the "approve in wallet" step
//! happens here: the user sees the payment and answers y/n before the
//! transaction is signed. Declining surfaces as a rejected signature.

use async_trait::async_trait;
use qrpay_core::{Address, SignerError, TransactionRequest, WalletSigner, H256, U256};
use qrpay_wallet::EthersWallet;
use tokio::io::AsyncBufRead;
use tracing::info;

use crate::input::LineInput;

/// Asks the user to approve one payment
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, summary: &str) -> bool;
}

/// Prompt on stderr and read the answer as the next input line; anything but
/// y/yes declines.
#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Confirm for LineInput<R> {
    async fn confirm(&self, summary: &str) -> bool {
        eprint!("Send {summary}? [y/N] ");
        let answer = self.next_line().await.unwrap_or_default();
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

pub struct ConfirmingSigner<S = EthersWallet> {
    inner: S,
    summary: String,
    confirm: Option<Box<dyn Confirm>>,
}

impl<S: WalletSigner> ConfirmingSigner<S> {
    /// Ask `confirm` before every signature; `None` signs without asking
    pub fn new(inner: S, summary: String, confirm: Option<Box<dyn Confirm>>) -> Self {
        Self {
            inner,
            summary,
            confirm,
        }
    }
}

#[async_trait]
impl<S: WalletSigner> WalletSigner for ConfirmingSigner<S> {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, SignerError> {
        self.inner.native_balance(owner).await
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, SignerError> {
        self.inner.token_balance(token, owner).await
    }

    async fn sign_and_submit(&self, tx: TransactionRequest) -> Result<H256, SignerError> {
        if let Some(confirm) = &self.confirm {
            if !confirm.confirm(&self.summary).await {
                info!("Payment declined at confirmation");
                return Err(SignerError::Rejected);
            }
        }
        self.inner.sign_and_submit(tx).await
    }
}
