//! Static bond registry.
//!
//! Descriptors are immutable for the process lifetime; everything here is
//! pure lookup over a compile-time table. Which bonds exist varies per
//! network, so list queries are network-scoped.

use serde::Serialize;

use crate::error::FetchError;

/// EVM chain id.
pub type NetworkId = u64;

/// Stable string key identifying a bond, e.g. `"clam-dai-lp"`.
pub type BondKey = &'static str;

pub const POLYGON_MAINNET: NetworkId = 137;
pub const POLYGON_MUMBAI: NetworkId = 80_001;

/// Reserve bonds take a single asset; LP bonds take a liquidity-pair token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BondCategory {
    Single,
    Lp,
}

/// Immutable descriptor for one bond instrument.
#[derive(Debug, Clone, Serialize)]
pub struct BondDescriptor {
    pub key: BondKey,
    pub name: &'static str,
    pub category: BondCategory,
    /// Deprecated bonds stay listed (users may still hold positions) but
    /// never report numeric price/discount.
    pub deprecated: bool,
    /// (4,4)-style bond: payout is staked on claim, earning the five-day
    /// rate on top of the discount.
    pub autostake: bool,
    /// External venue for acquiring the principal asset.
    pub dex_url: &'static str,
    /// Symbol the bond price is quoted in ("$" for USD-style display).
    pub quote_unit: &'static str,
    /// Networks this bond is deployed on.
    pub networks: &'static [NetworkId],
}

static BONDS: &[BondDescriptor] = &[
    BondDescriptor {
        key: "mai",
        name: "MAI",
        category: BondCategory::Single,
        deprecated: false,
        autostake: false,
        dex_url: "https://quickswap.exchange/#/swap?outputCurrency=0xa3fa99a148fa48d14ed51d610c367c61876997f1",
        quote_unit: "MAI",
        networks: &[POLYGON_MAINNET, POLYGON_MUMBAI],
    },
    BondDescriptor {
        key: "mai44",
        name: "MAI (4,4)",
        category: BondCategory::Single,
        deprecated: false,
        autostake: true,
        dex_url: "https://quickswap.exchange/#/swap?outputCurrency=0xa3fa99a148fa48d14ed51d610c367c61876997f1",
        quote_unit: "MAI",
        networks: &[POLYGON_MAINNET, POLYGON_MUMBAI],
    },
    BondDescriptor {
        key: "clam-mai-lp",
        name: "CLAM-MAI LP",
        category: BondCategory::Lp,
        deprecated: false,
        autostake: false,
        dex_url: "https://quickswap.exchange/#/add/0xa3fa99a148fa48d14ed51d610c367c61876997f1/0xC250e9987A032ACAC293d838726C511E6E1C029d",
        quote_unit: "$",
        networks: &[POLYGON_MAINNET, POLYGON_MUMBAI],
    },
    BondDescriptor {
        key: "clam-dai-lp",
        name: "CLAM-DAI LP",
        category: BondCategory::Lp,
        deprecated: false,
        autostake: false,
        dex_url: "https://quickswap.exchange/#/add/0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063/0xC250e9987A032ACAC293d838726C511E6E1C029d",
        quote_unit: "$",
        networks: &[POLYGON_MAINNET],
    },
    BondDescriptor {
        key: "frax",
        name: "FRAX",
        category: BondCategory::Single,
        deprecated: true,
        autostake: false,
        dex_url: "https://quickswap.exchange/#/swap?outputCurrency=0x45c32fa6df82ead1e2ef74d17b76547eddfaff89",
        quote_unit: "FRAX",
        networks: &[POLYGON_MAINNET],
    },
];

/// Look up a descriptor by key.
pub fn describe(key: &str) -> Result<&'static BondDescriptor, FetchError> {
    BONDS
        .iter()
        .find(|b| b.key == key)
        .ok_or_else(|| FetchError::UnknownBond(key.to_string()))
}

/// Keys of all bonds deployed on `network`, in registry order.
pub fn list_keys(network: NetworkId) -> Vec<BondKey> {
    BONDS
        .iter()
        .filter(|b| b.networks.contains(&network))
        .map(|b| b.key)
        .collect()
}

/// The full registry, network-agnostic. Display-only.
pub fn all() -> &'static [BondDescriptor] {
    BONDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_known_key() {
        let desc = describe("clam-dai-lp").unwrap();
        assert_eq!(desc.name, "CLAM-DAI LP");
        assert_eq!(desc.category, BondCategory::Lp);
        assert!(!desc.deprecated);
    }

    #[test]
    fn describe_unknown_key_fails() {
        match describe("ohm-dai-lp") {
            Err(FetchError::UnknownBond(key)) => assert_eq!(key, "ohm-dai-lp"),
            other => panic!("expected UnknownBond, got {other:?}"),
        }
    }

    #[test]
    fn list_keys_is_network_scoped_and_ordered() {
        let mainnet = list_keys(POLYGON_MAINNET);
        assert_eq!(mainnet, vec!["mai", "mai44", "clam-mai-lp", "clam-dai-lp", "frax"]);

        let mumbai = list_keys(POLYGON_MUMBAI);
        assert!(!mumbai.contains(&"clam-dai-lp"));
        assert!(!mumbai.contains(&"frax"));
        assert_eq!(mumbai, vec!["mai", "mai44", "clam-mai-lp"]);
    }

    #[test]
    fn list_keys_unknown_network_is_empty() {
        assert!(list_keys(1).is_empty());
    }

    #[test]
    fn registry_includes_retired_bonds() {
        // Deprecated bonds stay listed so held positions remain visible.
        assert!(all().iter().any(|b| b.deprecated));
        assert!(all().iter().any(|b| b.autostake));
    }
}
