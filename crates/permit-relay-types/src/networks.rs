//! Known EVM networks and their block explorers.
//!
//! The relay network reports executed tasks by chain id and transaction hash.
//! To hand a user something clickable, this module keeps a small registry of
//! well-known networks keyed by EIP-155 chain id, with the base URL of each
//! network's block explorer.
//!
//! # Examples
//!
//! ```
//! use permit_relay_types::networks::{network_by_chain_id, explorer_tx_url};
//!
//! let base = network_by_chain_id(8453).unwrap();
//! assert_eq!(base.name, "base");
//!
//! let url = explorer_tx_url(8453, "0xabc").unwrap();
//! assert_eq!(url, "https://basescan.org/tx/0xabc");
//!
//! assert!(explorer_tx_url(999_999, "0xabc").is_none());
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

/// A known network definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (e.g., "base-sepolia")
    pub name: &'static str,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Base URL of the block explorer, without trailing slash
    pub explorer: &'static str,
}

/// All networks the registry knows about.
pub static KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "ethereum",
        chain_id: 1,
        explorer: "https://etherscan.io",
    },
    NetworkInfo {
        name: "sepolia",
        chain_id: 11155111,
        explorer: "https://sepolia.etherscan.io",
    },
    NetworkInfo {
        name: "base",
        chain_id: 8453,
        explorer: "https://basescan.org",
    },
    NetworkInfo {
        name: "base-sepolia",
        chain_id: 84532,
        explorer: "https://sepolia.basescan.org",
    },
    NetworkInfo {
        name: "optimism",
        chain_id: 10,
        explorer: "https://optimistic.etherscan.io",
    },
    NetworkInfo {
        name: "arbitrum",
        chain_id: 42161,
        explorer: "https://arbiscan.io",
    },
    NetworkInfo {
        name: "arbitrum-sepolia",
        chain_id: 421614,
        explorer: "https://sepolia.arbiscan.io",
    },
    NetworkInfo {
        name: "polygon",
        chain_id: 137,
        explorer: "https://polygonscan.com",
    },
    NetworkInfo {
        name: "polygon-amoy",
        chain_id: 80002,
        explorer: "https://amoy.polygonscan.com",
    },
    NetworkInfo {
        name: "bsc",
        chain_id: 56,
        explorer: "https://bscscan.com",
    },
    NetworkInfo {
        name: "avalanche",
        chain_id: 43114,
        explorer: "https://snowtrace.io",
    },
    NetworkInfo {
        name: "avalanche-fuji",
        chain_id: 43113,
        explorer: "https://testnet.snowtrace.io",
    },
    NetworkInfo {
        name: "gnosis",
        chain_id: 100,
        explorer: "https://gnosisscan.io",
    },
];

static BY_CHAIN_ID: LazyLock<HashMap<u64, &'static NetworkInfo>> =
    LazyLock::new(|| KNOWN_NETWORKS.iter().map(|n| (n.chain_id, n)).collect());

/// Looks up a known network by its EIP-155 chain id.
pub fn network_by_chain_id(chain_id: u64) -> Option<&'static NetworkInfo> {
    BY_CHAIN_ID.get(&chain_id).copied()
}

/// Returns the explorer URL of a transaction on a known network.
pub fn explorer_tx_url(chain_id: u64, tx_hash: &str) -> Option<String> {
    network_by_chain_id(chain_id).map(|n| format!("{}/tx/{}", n.explorer, tx_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_chain_ids_are_unique() {
        let ids: HashSet<_> = KNOWN_NETWORKS.iter().map(|n| n.chain_id).collect();
        assert_eq!(ids.len(), KNOWN_NETWORKS.len());
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = KNOWN_NETWORKS.iter().map(|n| n.name).collect();
        assert_eq!(names.len(), KNOWN_NETWORKS.len());
    }

    #[test]
    fn test_explorer_urls_have_no_trailing_slash() {
        for network in KNOWN_NETWORKS {
            assert!(!network.explorer.ends_with('/'), "{}", network.name);
        }
    }

    #[test]
    fn test_explorer_tx_url() {
        assert_eq!(
            explorer_tx_url(137, "0xdeadbeef").as_deref(),
            Some("https://polygonscan.com/tx/0xdeadbeef")
        );
    }
}
