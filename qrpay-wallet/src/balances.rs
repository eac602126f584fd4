//! Balance refresh across the token registry.

use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use futures::future::join_all;
use qrpay_core::{
    format_display, RefreshSlot, TokenDescriptor, TokenKind, TokenRegistry, DISPLAY_DECIMALS,
};
use tracing::warn;

use crate::reader::ChainReader;

/// One row of the balances view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub symbol: String,
    pub decimals: u8,
    pub base_units: U256,
    /// Six-place display string
    pub display: String,
    /// False when the read failed and the zero is a placeholder
    pub fetched: bool,
}

async fn fetch_one<M: Middleware>(
    reader: &ChainReader<M>,
    token: &TokenDescriptor,
    owner: Address,
) -> TokenBalance {
    let result = match token.kind {
        TokenKind::Native => reader.native_balance(owner).await,
        TokenKind::Contract(contract) => reader.token_balance(contract, owner).await,
    };

    let (base_units, fetched) = match result {
        Ok(value) => (value, true),
        Err(e) => {
            warn!("Failed to fetch {} balance: {}", token.symbol, e);
            (U256::zero(), false)
        }
    };

    TokenBalance {
        symbol: token.symbol.clone(),
        decimals: token.decimals,
        base_units,
        display: format_display(base_units, token.decimals, DISPLAY_DECIMALS),
        fetched,
    }
}

/// Fetch every registry balance for `owner` concurrently, in registry order.
pub async fn fetch_balances<M: Middleware>(
    reader: &ChainReader<M>,
    registry: &TokenRegistry,
    owner: Address,
) -> Vec<TokenBalance> {
    join_all(registry.iter().map(|token| fetch_one(reader, token, owner))).await
}

/// Fetch balances and publish them to `slot` unless a newer refresh started
/// meanwhile. Returns whether this refresh's rows were published.
pub async fn refresh_balances<M: Middleware>(
    reader: &ChainReader<M>,
    registry: &TokenRegistry,
    owner: Address,
    slot: &RefreshSlot<Vec<TokenBalance>>,
) -> bool {
    let ticket = slot.begin();
    let balances = fetch_balances(reader, registry, owner).await;
    slot.complete(ticket, balances)
}
