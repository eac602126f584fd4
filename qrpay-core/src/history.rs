//! Transfer history rows for the history tab

use chrono::{DateTime, Utc};
use ethers_core::types::{Address, H256, U256};

use crate::display::format_display;
use crate::token::TokenDescriptor;
use crate::DISPLAY_DECIMALS;

/// A token `Transfer` event with its block time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub tx_hash: H256,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    /// Block timestamp, unix seconds
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "Sent",
            Direction::Received => "Received",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub tx_hash: H256,
    pub direction: Direction,
    /// The other side of the transfer
    pub counterparty: Address,
    /// Human-readable amount in whole tokens
    pub amount: String,
    pub token_symbol: String,
    pub timestamp: u64,
}

impl HistoryEntry {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.timestamp).ok()?, 0)
    }
}

/// Turn raw transfer events into display rows for `owner`, newest first.
///
/// A transfer from `owner` to itself counts as sent.
pub fn summarize_transfers(
    events: &[TransferEvent],
    owner: Address,
    token: &TokenDescriptor,
    limit: usize,
) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = events
        .iter()
        .filter_map(|event| {
            let (direction, counterparty) = if event.from == owner {
                (Direction::Sent, event.to)
            } else if event.to == owner {
                (Direction::Received, event.from)
            } else {
                return None;
            };
            Some(HistoryEntry {
                tx_hash: event.tx_hash,
                direction,
                counterparty,
                amount: format_display(event.value, token.decimals, DISPLAY_DECIMALS),
                token_symbol: token.symbol.clone(),
                timestamp: event.timestamp,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(limit);
    entries
}

/// Explorer link for a transaction
pub fn explorer_tx_url(base: &str, tx_hash: H256) -> String {
    if base.ends_with('/') {
        format!("{base}{tx_hash:#x}")
    } else {
        format!("{base}/{tx_hash:#x}")
    }
}
