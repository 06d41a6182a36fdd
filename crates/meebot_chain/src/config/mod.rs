//! # Client Configuration
//!
//! Endpoint, required chain, and the resource registry, loaded from TOML:
//!
//! ```toml
//! rpc_url = "http://127.0.0.1:9545"
//! poll_interval_ms = 1000
//!
//! [chain]
//! id = 31337
//! name = "Hardhat"
//!
//! [resources]
//! nft = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
//! token = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
//! staking = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"
//! # swap left out: the swap resource stays inert
//!
//! [swap]
//! rate = "0.0001"
//!
//! [events]
//! capacity = 100
//! ```
//!
//! Every field has a default; an empty document is a valid config with no
//! resources configured.

use std::path::Path;

use alloy_primitives::Address;
use serde::Deserialize;

use meebot_shared::constants::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_RPC_URL, DEFAULT_SWAP_RATE, MAX_EVENTS, REQUIRED_CHAIN_ID,
    REQUIRED_CHAIN_NAME,
};
use meebot_shared::ResourceKind;

use crate::error::ConfigError;

/// Top-level client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the ledger.
    pub rpc_url: String,
    /// Log polling interval for transports that poll.
    pub poll_interval_ms: u64,
    /// The chain the resources live on.
    pub chain: ChainConfig,
    /// Contract addresses.
    pub resources: ResourceRegistry,
    /// Swap quoting.
    pub swap: SwapConfig,
    /// Event log sizing.
    pub events: EventsConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            chain: ChainConfig::default(),
            resources: ResourceRegistry::default(),
            swap: SwapConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        let missing = config.resources.missing();
        if !missing.is_empty() {
            tracing::warn!(?missing, "resources without an address will be inert");
        }
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loading client config");
        Self::from_toml_str(&source)
    }
}

/// Required chain identity.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Chain id the wallet must be on.
    pub id: u64,
    /// Display name.
    pub name: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            id: REQUIRED_CHAIN_ID,
            name: REQUIRED_CHAIN_NAME.to_owned(),
        }
    }
}

/// Mapping from resource kind to contract address.
///
/// A kind without an address is not an error. Normalizers for it are inert,
/// reads return defaults, and actions on it fail their precondition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceRegistry {
    /// Collectible contract.
    pub nft: Option<Address>,
    /// Fungible token contract.
    pub token: Option<Address>,
    /// Staking facility.
    pub staking: Option<Address>,
    /// Swap facility.
    pub swap: Option<Address>,
}

impl ResourceRegistry {
    /// Address configured for `kind`.
    #[must_use]
    pub const fn address(&self, kind: ResourceKind) -> Option<Address> {
        match kind {
            ResourceKind::Nft => self.nft,
            ResourceKind::Token => self.token,
            ResourceKind::Staking => self.staking,
            ResourceKind::Swap => self.swap,
        }
    }

    /// Kinds with no address.
    #[must_use]
    pub fn missing(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.address(*kind).is_none())
            .collect()
    }
}

/// Swap quoting parameters.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwapConfig {
    /// Native currency per whole token, as a decimal string.
    pub rate: String,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_SWAP_RATE.to_owned(),
        }
    }
}

/// Event log sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
    /// Most records the log keeps. Clamped to at least one.
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_EVENTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.chain.id, 31337);
        assert_eq!(config.swap.rate, "0.0001");
        assert_eq!(config.events.capacity, 100);
        assert_eq!(config.resources.missing(), ResourceKind::ALL.to_vec());
    }

    #[test]
    fn test_partial_registry() {
        let config = ClientConfig::from_toml_str(
            r#"
            rpc_url = "http://localhost:8545"
            poll_interval_ms = 250

            [resources]
            nft = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            token = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.poll_interval_ms, 250);
        assert!(config.resources.address(ResourceKind::Nft).is_some());
        assert!(config.resources.address(ResourceKind::Swap).is_none());
        assert_eq!(
            config.resources.missing(),
            vec![ResourceKind::Staking, ResourceKind::Swap]
        );
    }

    #[test]
    fn test_bad_address_is_parse_error() {
        let err =
            ClientConfig::from_toml_str("[resources]\nnft = \"not-an-address\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(ClientConfig::from_toml_str("[resources]\nbridge = \"0x00\"\n").is_err());
    }

    #[test]
    fn test_load_reads_endpoint_and_poll_interval() {
        let path = std::env::temp_dir().join(format!("meebot-{}.toml", std::process::id()));
        let source = "rpc_url = \"http://10.0.0.2:8545\"\npoll_interval_ms = 4000\n";
        std::fs::write(&path, source).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.rpc_url, "http://10.0.0.2:8545");
        assert_eq!(config.poll_interval_ms, 4000);
        assert_eq!(config.chain, ChainConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ClientConfig::load("/definitely/not/here/meebot.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
