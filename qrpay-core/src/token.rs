//! Supported tokens
//!
//! The registry is loaded once at start-up and never mutated. A token is either
//! the chain's native asset or an ERC-20 contract; on the wire the native asset is
//! written as the all-zero sentinel address.

use std::str::FromStr;

use ethers_core::types::{Address, H160};
use serde::{Deserialize, Serialize};

use crate::amount::MAX_DECIMALS;
use crate::RegistryError;

/// USDC on Kaia mainnet (0xe2053bcf56d2030d2470fb454574237cf9ee3d4b)
pub const KAIA_USDC: Address = H160([
    0xe2, 0x05, 0x3b, 0xcf, 0x56, 0xd2, 0x03, 0x0d, 0x24, 0x70, 0xfb, 0x45, 0x45, 0x74, 0x23, 0x7c,
    0xf9, 0xee, 0x3d, 0x4b,
]);

/// USDT on Kaia mainnet (0xd077a400968890eacc75cdc901f0356c943e4fdb)
pub const KAIA_USDT: Address = H160([
    0xd0, 0x77, 0xa4, 0x00, 0x96, 0x88, 0x90, 0xea, 0xcc, 0x75, 0xcd, 0xc9, 0x01, 0xf0, 0x35, 0x6c,
    0x94, 0x3e, 0x4f, 0xdb,
]);

/// Native asset or deployed contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Native,
    Contract(Address),
}

impl TokenKind {
    /// Classify a wire address: the zero sentinel means native
    pub fn from_address(address: Address) -> Self {
        if address.is_zero() {
            TokenKind::Native
        } else {
            TokenKind::Contract(address)
        }
    }

    /// Address written into payloads (zero sentinel for native)
    pub fn wire_address(&self) -> Address {
        match self {
            TokenKind::Native => Address::zero(),
            TokenKind::Contract(address) => *address,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, TokenKind::Native)
    }
}

/// A supported token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub symbol: String,
    pub display_name: String,
    pub kind: TokenKind,
    pub decimals: u8,
    pub display_color: Option<String>,
}

impl TokenDescriptor {
    pub fn native(symbol: &str, display_name: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            kind: TokenKind::Native,
            decimals,
            display_color: None,
        }
    }

    pub fn contract(symbol: &str, display_name: &str, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            kind: TokenKind::Contract(address),
            decimals,
            display_color: None,
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.display_color = Some(color.to_string());
        self
    }

    /// Lower-case hex form of the wire address
    pub fn wire_address_hex(&self) -> String {
        format!("{:#x}", self.kind.wire_address())
    }

    /// Contract address, if this is not the native asset
    pub fn contract_address(&self) -> Option<Address> {
        match self.kind {
            TokenKind::Native => None,
            TokenKind::Contract(address) => Some(address),
        }
    }
}

/// On-disk token entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenConfig {
    symbol: String,
    name: String,
    /// Empty or all-zero for the native asset
    #[serde(default)]
    address: String,
    decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

impl TryFrom<TokenConfig> for TokenDescriptor {
    type Error = RegistryError;

    fn try_from(cfg: TokenConfig) -> Result<Self, Self::Error> {
        let kind = if cfg.address.trim().is_empty() {
            TokenKind::Native
        } else {
            let address = Address::from_str(cfg.address.trim()).map_err(|_| {
                RegistryError::InvalidAddress {
                    symbol: cfg.symbol.clone(),
                    address: cfg.address.clone(),
                }
            })?;
            TokenKind::from_address(address)
        };

        Ok(TokenDescriptor {
            symbol: cfg.symbol,
            display_name: cfg.name,
            kind,
            decimals: cfg.decimals,
            display_color: cfg.color,
        })
    }
}

/// The set of tokens the wallet can request and pay with
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<TokenDescriptor>,
}

impl TokenRegistry {
    /// Build a registry, rejecting duplicate or empty symbols
    pub fn new(tokens: Vec<TokenDescriptor>) -> Result<Self, RegistryError> {
        for (i, token) in tokens.iter().enumerate() {
            if token.symbol.is_empty() {
                return Err(RegistryError::EmptySymbol);
            }
            if token.decimals > MAX_DECIMALS {
                return Err(RegistryError::UnsupportedDecimals {
                    symbol: token.symbol.clone(),
                    decimals: token.decimals,
                });
            }
            if tokens[..i].iter().any(|t| t.symbol == token.symbol) {
                return Err(RegistryError::DuplicateSymbol(token.symbol.clone()));
            }
        }
        Ok(Self { tokens })
    }

    /// Tokens supported on Kaia mainnet
    pub fn kaia_mainnet() -> Self {
        Self {
            tokens: vec![
                TokenDescriptor::contract("USDC", "USD Coin", KAIA_USDC, 6).with_color("#2775CA"),
                TokenDescriptor::contract("USDT", "Tether USD", KAIA_USDT, 6).with_color("#26A17B"),
                TokenDescriptor::native("KAI", "Kaia", 18).with_color("#00D4AA"),
            ],
        }
    }

    /// Parse a JSON array of `{symbol, name, address, decimals, color}` entries
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let configs: Vec<TokenConfig> = serde_json::from_str(json)?;
        let tokens = configs
            .into_iter()
            .map(TokenDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tokens)
    }

    /// Exact, case-sensitive symbol lookup
    pub fn get(&self, symbol: &str) -> Option<&TokenDescriptor> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    pub fn by_address(&self, address: Address) -> Option<&TokenDescriptor> {
        let kind = TokenKind::from_address(address);
        self.tokens.iter().find(|t| t.kind == kind)
    }

    pub fn native(&self) -> Option<&TokenDescriptor> {
        self.tokens.iter().find(|t| t.kind.is_native())
    }

    /// First entry, used as the default selection
    pub fn first(&self) -> Option<&TokenDescriptor> {
        self.tokens.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenDescriptor> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::kaia_mainnet()
    }
}
