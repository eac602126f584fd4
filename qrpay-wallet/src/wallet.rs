//! Signing wallet backed by an ethers middleware stack.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, MiddlewareError, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionRequest, H256, U256};
use qrpay_core::{SignerError, WalletSigner};
use tracing::{debug, info};

use crate::config::WalletConfig;
use crate::reader::ChainReader;

/// EIP-1193 "user rejected request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// The production middleware stack: HTTP provider plus local key.
pub type EthersClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Wallet signing through an ethers middleware.
pub struct EthersWallet<M = EthersClient> {
    client: Arc<M>,
    address: Address,
}

impl EthersWallet<EthersClient> {
    /// Connect using the configured RPC endpoint and private key.
    pub fn connect(config: &WalletConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .context("Failed to create HTTP provider")?;

        let key = config
            .private_key
            .as_deref()
            .context("QRPAY_PRIVATE_KEY must be set to sign transactions")?;
        let wallet = key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .context("Invalid private key")?
            .with_chain_id(config.chain_id);

        let address = wallet.address();
        info!("Wallet {:#x} on chain {}", address, config.chain_id);

        let client = SignerMiddleware::new(provider, wallet);
        Ok(Self::new(Arc::new(client), address))
    }
}

impl<M: Middleware> EthersWallet<M> {
    pub fn new(client: Arc<M>, address: Address) -> Self {
        Self { client, address }
    }

    /// Read-only view over the same client.
    pub fn reader(&self) -> ChainReader<M> {
        ChainReader::new(Arc::clone(&self.client))
    }
}

/// Map a JSON-RPC error onto the signer error taxonomy.
pub fn classify_rpc_error(code: i64, message: &str) -> SignerError {
    if code == USER_REJECTED_CODE {
        return SignerError::Rejected;
    }
    classify_message(message)
}

fn classify_message(message: &str) -> SignerError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("insufficient funds") || lower.contains("insufficient balance") {
        SignerError::InsufficientFunds
    } else if lower.contains("user rejected") || lower.contains("user denied") {
        SignerError::Rejected
    } else {
        SignerError::Node(message.to_string())
    }
}

fn classify<E: MiddlewareError>(err: E) -> SignerError {
    match err.as_error_response() {
        Some(rpc) => classify_rpc_error(rpc.code, &rpc.message),
        None => classify_message(&err.to_string()),
    }
}

#[async_trait]
impl<M> WalletSigner for EthersWallet<M>
where
    M: Middleware + 'static,
{
    fn address(&self) -> Address {
        self.address
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, SignerError> {
        self.reader().native_balance(owner).await
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, SignerError> {
        self.reader().token_balance(token, owner).await
    }

    async fn sign_and_submit(&self, tx: TransactionRequest) -> Result<H256, SignerError> {
        debug!("Sending transaction to {:?}", tx.to);

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(classify)?;
        let tx_hash = pending.tx_hash();

        info!("Transaction broadcast: {:#x}", tx_hash);
        Ok(tx_hash)
    }
}
