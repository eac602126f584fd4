//! Transfer history for the history tab.

use ethers::providers::Middleware;
use ethers::types::Address;
use qrpay_core::{summarize_transfers, HistoryEntry, RefreshSlot, TokenDescriptor};
use tracing::{info, warn};

use crate::reader::ChainReader;

/// Recent transfers of `token` involving `owner`, newest first.
///
/// The native asset emits no `Transfer` logs, so it has no history here. Node
/// failures leave the list empty.
pub async fn fetch_history<M: Middleware>(
    reader: &ChainReader<M>,
    token: &TokenDescriptor,
    owner: Address,
    from_block: u64,
    limit: usize,
) -> Vec<HistoryEntry> {
    let Some(contract) = token.contract_address() else {
        info!("{} is the native token, no transfer logs to scan", token.symbol);
        return Vec::new();
    };

    match reader.transfer_events(contract, owner, from_block).await {
        Ok(events) => summarize_transfers(&events, owner, token, limit),
        Err(e) => {
            warn!("Failed to fetch {} history: {}", token.symbol, e);
            Vec::new()
        }
    }
}

/// [`fetch_history`] published through a last-write-wins slot.
pub async fn refresh_history<M: Middleware>(
    reader: &ChainReader<M>,
    token: &TokenDescriptor,
    owner: Address,
    from_block: u64,
    limit: usize,
    slot: &RefreshSlot<Vec<HistoryEntry>>,
) -> bool {
    let ticket = slot.begin();
    let rows = fetch_history(reader, token, owner, from_block, limit).await;
    slot.complete(ticket, rows)
}
