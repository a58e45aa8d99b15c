//! Solidity interfaces and the typed interface registry.
//!
//! Every contract the SDK talks to plays one [`ContractRole`]. The registry
//! maps a role to the set of methods the SDK is allowed to invoke on it,
//! with their mutability. It is built once and shared by every
//! [`ContractGateway`](crate::gateway::ContractGateway).

use std::fmt;

use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};

sol! {
    #![sol(all_derives)]

    /// Metadata tuple returned by a wrapper's `info()`.
    struct WrapperInfo {
        address dTokenAddress;
        address cAssetAddress;
        uint8 dTokenDecimals;
        uint8 cAssetDecimals;
        uint256 dTokenInFeeBps;
        uint256 dTokenOutFeeBps;
        address dTokenTreasury;
        address cAssetTreasury;
    }

    /// ERC20 subset used for metadata, balances and approvals.
    interface IFungibleAsset {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Wrapper factory: the on-chain directory of wrapper instances.
    interface IWrapperRegistry {
        function getAllWraps() external view returns (address[]);
    }

    interface IWrapper {
        function info() external view returns (WrapperInfo memory);
    }

    /// Router that executes exchanges once it holds an allowance.
    interface IWrapRouter {
        function wrap(address dToken, uint256 amount, address cAsset) external;
        function unwrap(address cAsset, uint256 amount, address dToken) external;
    }
}

// ─── Roles ───────────────────────────────────────────────────────────────────

/// Logical role a contract plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractRole {
    Registry,
    Wrapper,
    Router,
    FungibleAsset,
}

impl ContractRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::Wrapper => "wrapper",
            Self::Router => "router",
            Self::FungibleAsset => "fungible_asset",
        }
    }
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a method only reads state or submits a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    View,
    Mutating,
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutability::View => write!(f, "view"),
            Mutability::Mutating => write!(f, "mutating"),
        }
    }
}

// ─── Interface descriptions ──────────────────────────────────────────────────

/// One callable method of an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub signature: &'static str,
    pub selector: [u8; 4],
    pub mutability: Mutability,
}

impl MethodSpec {
    pub fn of<C: SolCall>(mutability: Mutability) -> Self {
        Self {
            signature: C::SIGNATURE,
            selector: C::SELECTOR,
            mutability,
        }
    }
}

/// The methods exposed by one contract role.
#[derive(Debug, Clone)]
pub struct InterfaceSpec {
    pub role: ContractRole,
    pub methods: Vec<MethodSpec>,
}

impl InterfaceSpec {
    pub fn method(&self, selector: [u8; 4]) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.selector == selector)
    }

    /// Whether the interface declares `C` with the given mutability.
    pub fn declares<C: SolCall>(&self, mutability: Mutability) -> bool {
        self.method(C::SELECTOR)
            .map(|m| m.mutability == mutability)
            .unwrap_or(false)
    }
}

/// Interface descriptions keyed by role.
#[derive(Debug, Clone)]
pub struct InterfaceRegistry {
    registry: InterfaceSpec,
    wrapper: InterfaceSpec,
    router: InterfaceSpec,
    fungible_asset: InterfaceSpec,
}

impl InterfaceRegistry {
    /// The interfaces used by the dToken ⇄ cAsset protocol.
    pub fn standard() -> Self {
        use Mutability::{Mutating, View};

        Self {
            registry: InterfaceSpec {
                role: ContractRole::Registry,
                methods: vec![MethodSpec::of::<IWrapperRegistry::getAllWrapsCall>(View)],
            },
            wrapper: InterfaceSpec {
                role: ContractRole::Wrapper,
                methods: vec![MethodSpec::of::<IWrapper::infoCall>(View)],
            },
            router: InterfaceSpec {
                role: ContractRole::Router,
                methods: vec![
                    MethodSpec::of::<IWrapRouter::wrapCall>(Mutating),
                    MethodSpec::of::<IWrapRouter::unwrapCall>(Mutating),
                ],
            },
            fungible_asset: InterfaceSpec {
                role: ContractRole::FungibleAsset,
                methods: vec![
                    MethodSpec::of::<IFungibleAsset::symbolCall>(View),
                    MethodSpec::of::<IFungibleAsset::decimalsCall>(View),
                    MethodSpec::of::<IFungibleAsset::balanceOfCall>(View),
                    MethodSpec::of::<IFungibleAsset::approveCall>(Mutating),
                ],
            },
        }
    }

    pub fn get(&self, role: ContractRole) -> &InterfaceSpec {
        match role {
            ContractRole::Registry => &self.registry,
            ContractRole::Wrapper => &self.wrapper,
            ContractRole::Router => &self.router,
            ContractRole::FungibleAsset => &self.fungible_asset,
        }
    }
}

lazy_static::lazy_static! {
    /// Process-wide interface registry.
    pub static ref INTERFACES: InterfaceRegistry = InterfaceRegistry::standard();
}
