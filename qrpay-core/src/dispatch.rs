//! Transfer submission
//!
//! A validated [`TransferRequest`] becomes exactly one transaction: a plain value
//! transfer for the native asset, or a single ERC-20 `transfer(to, amount)` call.
//! There is no retry here. The user confirmed one payment and gets at most one
//! submission; trying again means building a fresh request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::abi::{self, Token};
use ethers_core::types::{Address, Bytes, TransactionRequest, H256, U256};
use ethers_core::utils::id;
use tracing::{info, warn};

use crate::token::TokenKind;
use crate::validate::TransferRequest;
use crate::{DispatchError, SignerError};

/// ERC-20 `transfer(address,uint256)`
pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";

/// The connected wallet: balance reads plus sign-and-submit
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Active account
    fn address(&self) -> Address;

    async fn native_balance(&self, owner: Address) -> Result<U256, SignerError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, SignerError>;

    /// Sign and broadcast; returns the transaction hash
    async fn sign_and_submit(&self, tx: TransactionRequest) -> Result<H256, SignerError>;
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub tx_hash: H256,
    pub token_symbol: String,
    pub recipient: Address,
    pub amount_base_units: U256,
}

impl DispatchReceipt {
    pub fn tx_hash_hex(&self) -> String {
        format!("{:#x}", self.tx_hash)
    }
}

/// ABI calldata for `transfer(to, amount)`
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    let mut data = id(TRANSFER_SIGNATURE).to_vec();
    data.extend(abi::encode(&[Token::Address(to), Token::Uint(amount)]));
    Bytes::from(data)
}

/// Build the unsigned transaction for a request
pub fn build_transaction(request: &TransferRequest, from: Address) -> TransactionRequest {
    match request.token.kind {
        TokenKind::Native => TransactionRequest::new()
            .from(from)
            .to(request.recipient)
            .value(request.amount_base_units),
        TokenKind::Contract(contract) => TransactionRequest::new()
            .from(from)
            .to(contract)
            .value(U256::zero())
            .data(transfer_calldata(request.recipient, request.amount_base_units)),
    }
}

/// Submit one transfer for `request` through `signer`
pub async fn dispatch<S>(
    request: &TransferRequest,
    signer: &S,
) -> Result<DispatchReceipt, DispatchError>
where
    S: WalletSigner + ?Sized,
{
    let from = signer.address();
    let needed = request.amount_base_units;

    let balance = match request.token.kind {
        TokenKind::Native => signer.native_balance(from).await,
        TokenKind::Contract(contract) => signer.token_balance(contract, from).await,
    };
    match balance {
        Ok(available) if available < needed => {
            warn!(
                "Refusing {} transfer: balance {} below {}",
                request.token.symbol, available, needed
            );
            return Err(DispatchError::InsufficientFunds {
                needed,
                available: Some(available),
            });
        }
        Ok(_) => {}
        Err(e) => warn!(
            "Balance check for {} failed, submitting anyway: {}",
            request.token.symbol, e
        ),
    }

    let tx = build_transaction(request, from);
    info!(
        "Submitting {} transfer of {} base units to {:#x}",
        request.token.symbol, needed, request.recipient
    );

    let tx_hash = signer.sign_and_submit(tx).await.map_err(|e| match e {
        SignerError::Rejected => DispatchError::UserRejected,
        SignerError::InsufficientFunds => DispatchError::InsufficientFunds {
            needed,
            available: None,
        },
        SignerError::Node(msg) => DispatchError::SubmissionFailed(msg),
    })?;

    info!("Transaction submitted: {:#x}", tx_hash);

    Ok(DispatchReceipt {
        tx_hash,
        token_symbol: request.token.symbol.clone(),
        recipient: request.recipient,
        amount_base_units: needed,
    })
}

/// Marks a single in-flight user action. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag, or `None` if an action is already running
    pub fn try_begin(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the busy flag when dropped
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
