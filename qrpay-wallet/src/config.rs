//! Wallet configuration.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use qrpay_core::{TokenRegistry, KAIA_CHAIN_ID, KAIA_EXPLORER_TX_URL, KAIA_RPC_URL};

/// Wallet configuration.
#[derive(Clone)]
pub struct WalletConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Chain id used when signing.
    pub chain_id: u64,
    /// Explorer prefix for transaction links.
    pub explorer_url: String,
    /// Hex private key; only needed to sign.
    pub private_key: Option<String>,
    /// Token whose transfers make up the history tab.
    pub history_token: String,
    /// First block scanned for history.
    pub history_from_block: u64,
    /// JSON token list replacing the built-in registry.
    pub tokens_file: Option<PathBuf>,
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("explorer_url", &self.explorer_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("history_token", &self.history_token)
            .field("history_from_block", &self.history_from_block)
            .field("tokens_file", &self.tokens_file)
            .finish()
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: KAIA_RPC_URL.to_string(),
            chain_id: KAIA_CHAIN_ID,
            explorer_url: KAIA_EXPLORER_TX_URL.to_string(),
            private_key: None,
            history_token: "USDT".to_string(),
            history_from_block: 0,
            tokens_file: None,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} is not valid: {raw}")),
        None => Ok(default),
    }
}

impl WalletConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let rpc_url = lookup("QRPAY_RPC_URL").unwrap_or(defaults.rpc_url);
        let chain_id = parse_var(&lookup, "QRPAY_CHAIN_ID", defaults.chain_id)?;
        let explorer_url = lookup("QRPAY_EXPLORER_URL").unwrap_or(defaults.explorer_url);
        let private_key = lookup("QRPAY_PRIVATE_KEY").filter(|key| !key.trim().is_empty());
        let history_token = lookup("QRPAY_HISTORY_TOKEN").unwrap_or(defaults.history_token);
        let history_from_block =
            parse_var(&lookup, "QRPAY_HISTORY_FROM_BLOCK", defaults.history_from_block)?;
        let tokens_file = lookup("QRPAY_TOKENS_FILE").map(PathBuf::from);

        Ok(Self {
            rpc_url,
            chain_id,
            explorer_url,
            private_key,
            history_token,
            history_from_block,
            tokens_file,
        })
    }

    /// The token registry: the tokens file if configured, otherwise Kaia mainnet.
    pub fn registry(&self) -> Result<TokenRegistry> {
        match &self.tokens_file {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read tokens file {}", path.display()))?;
                TokenRegistry::from_json(&json)
                    .with_context(|| format!("Invalid tokens file {}", path.display()))
            }
            None => Ok(TokenRegistry::kaia_mainnet()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WalletConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.rpc_url, "https://public-en.node.kaia.io");
        assert_eq!(config.chain_id, 8217);
        assert_eq!(config.explorer_url, "https://scope.kaia.one/tx/");
        assert!(config.private_key.is_none());
        assert_eq!(config.history_token, "USDT");
        assert_eq!(config.history_from_block, 0);
        assert!(config.tokens_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = WalletConfig::from_lookup(lookup(&[
            ("QRPAY_RPC_URL", "http://localhost:8545"),
            ("QRPAY_CHAIN_ID", "1001"),
            ("QRPAY_PRIVATE_KEY", "0x01"),
            ("QRPAY_HISTORY_FROM_BLOCK", " 150000000 "),
            ("QRPAY_TOKENS_FILE", "/etc/qrpay/tokens.json"),
        ]))
        .unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.chain_id, 1001);
        assert_eq!(config.private_key.as_deref(), Some("0x01"));
        assert_eq!(config.history_from_block, 150_000_000);
        assert_eq!(config.tokens_file, Some(PathBuf::from("/etc/qrpay/tokens.json")));
    }

    #[test]
    fn test_bad_number() {
        let err = WalletConfig::from_lookup(lookup(&[("QRPAY_CHAIN_ID", "kaia")])).unwrap_err();
        assert!(err.to_string().contains("QRPAY_CHAIN_ID"));
    }

    #[test]
    fn test_key_redacted() {
        let config = WalletConfig {
            private_key: Some("0xdeadbeef".to_string()),
            ..WalletConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_missing_tokens_file() {
        let config = WalletConfig {
            tokens_file: Some(PathBuf::from("/nonexistent/qrpay-tokens.json")),
            ..WalletConfig::default()
        };
        assert!(config.registry().is_err());
        assert_eq!(WalletConfig::default().registry().unwrap().len(), 3);
    }
}
