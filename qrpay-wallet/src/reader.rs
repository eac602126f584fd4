//! Read-only chain access: balances, transfer logs and block times.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, BlockId, BlockNumber, Bytes, Filter, Log, TransactionRequest, ValueOrArray, H256,
    U256, U64,
};
use qrpay_core::{SignerError, TransferEvent};
use tracing::debug;

/// ERC-20 `Transfer(address,address,uint256)`
pub const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";

/// ERC-20 `balanceOf(address)`
pub const BALANCE_OF_SIGNATURE: &str = "balanceOf(address)";

pub(crate) fn node_error(err: impl std::fmt::Display) -> SignerError {
    SignerError::Node(err.to_string())
}

/// Balance and log queries against any ethers middleware.
#[derive(Debug)]
pub struct ChainReader<M> {
    client: Arc<M>,
}

impl<M> Clone for ChainReader<M> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl ChainReader<Provider<Http>> {
    /// Plain HTTP reader, no signing key required.
    pub fn connect(rpc_url: &str) -> Result<Self> {
        let provider =
            Provider::<Http>::try_from(rpc_url).context("Failed to create HTTP provider")?;
        Ok(Self::new(Arc::new(provider)))
    }
}

impl<M: Middleware> ChainReader<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }

    pub async fn native_balance(&self, owner: Address) -> Result<U256, SignerError> {
        self.client.get_balance(owner, None).await.map_err(node_error)
    }

    pub async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, SignerError> {
        let mut data = ethers::utils::id(BALANCE_OF_SIGNATURE).to_vec();
        data.extend(ethers::abi::encode(&[ethers::abi::Token::Address(owner)]));

        let tx: TypedTransaction = TransactionRequest::new()
            .to(token)
            .data(Bytes::from(data))
            .into();
        let output = self.client.call(&tx, None).await.map_err(node_error)?;

        if output.len() < 32 {
            return Err(SignerError::Node(format!(
                "balanceOf returned {} bytes",
                output.len()
            )));
        }
        Ok(U256::from_big_endian(&output[..32]))
    }

    /// Transfer events of `token` sent or received by `owner` since `from_block`.
    ///
    /// Block times are looked up per block; a failed lookup leaves the
    /// timestamp at zero.
    pub async fn transfer_events(
        &self,
        token: Address,
        owner: Address,
        from_block: u64,
    ) -> Result<Vec<TransferEvent>, SignerError> {
        let owner_topic = ValueOrArray::Value(H256::from(owner));
        let base = Filter::new()
            .address(token)
            .event(TRANSFER_EVENT)
            .from_block(from_block);

        let sent = self
            .client
            .get_logs(&base.clone().topic1(owner_topic.clone()))
            .await
            .map_err(node_error)?;
        let received = self
            .client
            .get_logs(&base.topic2(owner_topic))
            .await
            .map_err(node_error)?;
        debug!(
            "Fetched {} sent and {} received transfer logs",
            sent.len(),
            received.len()
        );

        let mut seen = HashSet::new();
        let mut timestamps: HashMap<U64, u64> = HashMap::new();
        let mut events = Vec::with_capacity(sent.len() + received.len());
        for log in sent.iter().chain(received.iter()) {
            // A self-transfer matches both queries
            if !seen.insert((log.transaction_hash, log.log_index)) {
                continue;
            }
            let Some(mut event) = parse_transfer_log(log) else {
                continue;
            };
            if let Some(number) = log.block_number {
                if !timestamps.contains_key(&number) {
                    let timestamp = self.block_timestamp(number.as_u64()).await.unwrap_or(0);
                    timestamps.insert(number, timestamp);
                }
                event.timestamp = timestamps.get(&number).copied().unwrap_or(0);
            }
            events.push(event);
        }
        Ok(events)
    }

    pub async fn block_timestamp(&self, number: u64) -> Result<u64, SignerError> {
        let block = self
            .client
            .get_block(BlockId::Number(BlockNumber::Number(U64::from(number))))
            .await
            .map_err(node_error)?
            .ok_or_else(|| SignerError::Node(format!("block {number} not found")))?;
        Ok(block.timestamp.low_u64())
    }
}

/// Decode a `Transfer` log; `None` for anything that does not look like one.
pub fn parse_transfer_log(log: &Log) -> Option<TransferEvent> {
    if log.topics.len() != 3 || log.data.len() < 32 {
        return None;
    }
    Some(TransferEvent {
        tx_hash: log.transaction_hash.unwrap_or_default(),
        from: Address::from(log.topics[1]),
        to: Address::from(log.topics[2]),
        value: U256::from_big_endian(&log.data[..32]),
        timestamp: 0,
    })
}
