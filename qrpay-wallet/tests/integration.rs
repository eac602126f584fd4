//! Integration tests for the ethers-backed reader and wallet, against a mocked provider.
//!
//! The mock provider answers requests from a stack: the last response pushed is
//! the first one consumed.

use std::sync::Arc;

use ethers::providers::{MockProvider, Provider};
use ethers::types::{Address, Bytes, Log, H256, U256, U64};
use qrpay_core::{
    Direction, RefreshSlot, TokenDescriptor, TokenRegistry, WalletSigner, HISTORY_LIMIT,
};
use qrpay_wallet::{
    fetch_balances, fetch_history, parse_transfer_log, refresh_balances, refresh_history,
    ChainReader, EthersWallet,
};

// === Test Fixtures ===

fn owner() -> Address {
    Address::repeat_byte(0x11)
}

fn other() -> Address {
    Address::repeat_byte(0x22)
}

fn mocked() -> (ChainReader<Provider<MockProvider>>, MockProvider) {
    let (provider, mock) = Provider::mocked();
    (ChainReader::new(Arc::new(provider)), mock)
}

fn word(value: U256) -> Bytes {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    Bytes::from(buf.to_vec())
}

fn transfer_log(tx: u64, from: Address, to: Address, value: u64) -> Log {
    Log {
        address: Address::repeat_byte(0xd0),
        topics: vec![
            H256::from(ethers::utils::keccak256("Transfer(address,address,uint256)")),
            H256::from(from),
            H256::from(to),
        ],
        data: word(U256::from(value)),
        transaction_hash: Some(H256::from_low_u64_be(tx)),
        log_index: Some(U256::zero()),
        ..Default::default()
    }
}

fn single(token: TokenDescriptor) -> TokenRegistry {
    TokenRegistry::new(vec![token]).unwrap()
}

// === Balances ===

#[tokio::test]
async fn test_native_balance() {
    let (reader, mock) = mocked();
    mock.push::<U256, _>(U256::from(1_500_000_000_000_000_000u64)).unwrap();

    let registry = single(TokenDescriptor::native("KAI", "Kaia", 18));
    let balances = fetch_balances(&reader, &registry, owner()).await;

    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].symbol, "KAI");
    assert_eq!(balances[0].display, "1.5");
    assert!(balances[0].fetched);
}

#[tokio::test]
async fn test_token_balance() {
    let (reader, mock) = mocked();
    mock.push::<Bytes, _>(word(U256::from(5_250_000u64))).unwrap();

    let registry = TokenRegistry::kaia_mainnet();
    let usdc = registry.get("USDC").unwrap().clone();
    let balances = fetch_balances(&reader, &single(usdc), owner()).await;

    assert_eq!(balances[0].base_units, U256::from(5_250_000u64));
    assert_eq!(balances[0].display, "5.25");
}

#[tokio::test]
async fn test_failed_balance_reads_as_zero() {
    let (reader, _mock) = mocked();

    let balances = fetch_balances(&reader, &TokenRegistry::kaia_mainnet(), owner()).await;

    assert_eq!(balances.len(), 3);
    for balance in balances {
        assert_eq!(balance.base_units, U256::zero());
        assert_eq!(balance.display, "0");
        assert!(!balance.fetched);
    }
}

#[tokio::test]
async fn test_short_balance_of_output_is_an_error() {
    let (reader, mock) = mocked();
    mock.push::<Bytes, _>(Bytes::from(vec![1u8, 2, 3])).unwrap();

    assert!(reader.token_balance(Address::repeat_byte(0xd0), owner()).await.is_err());
}

// === History ===

#[tokio::test]
async fn test_history_directions() {
    let (reader, mock) = mocked();
    // Second query (received), then first query (sent)
    mock.push::<Vec<Log>, _>(vec![transfer_log(2, other(), owner(), 250_000)]).unwrap();
    mock.push::<Vec<Log>, _>(vec![transfer_log(1, owner(), other(), 1_500_000)]).unwrap();

    let registry = TokenRegistry::kaia_mainnet();
    let usdt = registry.get("USDT").unwrap();
    let rows = fetch_history(&reader, usdt, owner(), 0, HISTORY_LIMIT).await;

    assert_eq!(rows.len(), 2);
    let sent = rows.iter().find(|r| r.direction == Direction::Sent).unwrap();
    assert_eq!(sent.amount, "1.5");
    assert_eq!(sent.counterparty, other());
    let received = rows.iter().find(|r| r.direction == Direction::Received).unwrap();
    assert_eq!(received.amount, "0.25");
}

#[tokio::test]
async fn test_self_transfer_listed_once() {
    let (reader, mock) = mocked();
    let log = transfer_log(7, owner(), owner(), 1_000_000);
    mock.push::<Vec<Log>, _>(vec![log.clone()]).unwrap();
    mock.push::<Vec<Log>, _>(vec![log]).unwrap();

    let events = reader
        .transfer_events(Address::repeat_byte(0xd0), owner(), 0)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_missing_block_time_is_zero() {
    let (reader, mock) = mocked();
    let mut log = transfer_log(3, other(), owner(), 1);
    log.block_number = Some(U64::from(42u64));
    mock.push::<Vec<Log>, _>(vec![log]).unwrap();
    mock.push::<Vec<Log>, _>(Vec::<Log>::new()).unwrap();

    let events = reader
        .transfer_events(Address::repeat_byte(0xd0), owner(), 0)
        .await
        .unwrap();
    assert_eq!(events[0].timestamp, 0);
}

#[tokio::test]
async fn test_history_failure_is_empty() {
    let (reader, _mock) = mocked();
    let registry = TokenRegistry::kaia_mainnet();

    let rows = fetch_history(&reader, registry.get("USDT").unwrap(), owner(), 0, 10).await;
    assert!(rows.is_empty());

    // Native token has no logs to scan
    let rows = fetch_history(&reader, registry.get("KAI").unwrap(), owner(), 0, 10).await;
    assert!(rows.is_empty());
}

#[test]
fn test_parse_transfer_log() {
    let event = parse_transfer_log(&transfer_log(9, owner(), other(), 77)).unwrap();
    assert_eq!(event.from, owner());
    assert_eq!(event.to, other());
    assert_eq!(event.value, U256::from(77u64));

    let mut approval = transfer_log(9, owner(), other(), 77);
    approval.topics.pop();
    assert!(parse_transfer_log(&approval).is_none());
}

// === Wallet ===

#[tokio::test]
async fn test_wallet_reads_through_client() {
    let (provider, mock) = Provider::mocked();
    mock.push::<U256, _>(U256::from(42u64)).unwrap();

    let wallet = EthersWallet::new(Arc::new(provider), owner());
    assert_eq!(WalletSigner::address(&wallet), owner());
    assert_eq!(wallet.native_balance(owner()).await.unwrap(), U256::from(42u64));
}

// === Refresh ===

#[tokio::test]
async fn test_refresh_publishes_latest() {
    let (reader, mock) = mocked();
    mock.push::<U256, _>(U256::from(2u64)).unwrap();
    mock.push::<U256, _>(U256::exp10(18)).unwrap();

    let registry = single(TokenDescriptor::native("KAI", "Kaia", 18));
    let slot = RefreshSlot::new();

    assert!(refresh_balances(&reader, &registry, owner(), &slot).await);
    assert_eq!(slot.get().unwrap()[0].display, "1");

    assert!(refresh_balances(&reader, &registry, owner(), &slot).await);
    assert_eq!(slot.get().unwrap()[0].base_units, U256::from(2u64));
}

#[tokio::test]
async fn test_refresh_history_native_is_empty() {
    let (reader, _mock) = mocked();
    let registry = TokenRegistry::kaia_mainnet();
    let slot = RefreshSlot::new();

    let kai = registry.get("KAI").unwrap();
    assert!(refresh_history(&reader, kai, owner(), 0, HISTORY_LIMIT, &slot).await);
    assert_eq!(slot.get(), Some(Vec::new()));
}
