//! # dToken ⇄ cAsset wrap SDK
//!
//! A Rust SDK for exchanging an underlying token (dToken) for its
//! fee-adjusted derivative (cAsset) and back, through on-chain wrapper
//! contracts, supporting both native and WASM targets.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Newtypes, amount codec, Solidity interfaces, errors (always available, WASM-safe)
//! 2. **Provider** — `RpcTransport`: HTTP JSON-RPC (native) / injected `window.ethereum` (WASM)
//! 3. **Session & Gateway** — `WalletSession` handles and typed `ContractProxy` calls
//! 4. **Protocols** — allowance-then-action exchanges, registry scans, quotes
//! 5. **High-Level Client** — `WrapClient` with a builder and an envelope sub-client
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dfcs_wrap_sdk::prelude::*;
//!
//! let client = WrapClient::builder()
//!     .rpc_url("https://rpc.example.org")
//!     .build()?;
//!
//! let wrappers = client.scan_wrappers(client.registry_address()).await?;
//! let pair = ExchangePair::for_symbol(&wrappers, "DUSD").unwrap();
//! let quote = client.quote(&pair, "12.5")?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes and the amount codec.
pub mod shared;

/// Solidity interfaces and the role-keyed interface registry.
pub mod abi;

/// Unified SDK error types.
pub mod error;

/// Deployment constants.
pub mod network;

/// `ResultEnvelope` for crossing process boundaries.
pub mod envelope;

// ── Layer 2: Provider ────────────────────────────────────────────────────────

/// JSON-RPC transports and typed eth methods.
pub mod provider;

// ── Layer 3: Session & Gateway ───────────────────────────────────────────────

/// Query handles, signing identities and the wallet session.
pub mod session;

/// Typed contract proxies.
pub mod gateway;

// ── Layer 4: Protocols ───────────────────────────────────────────────────────

/// Allowance-then-action exchanges.
pub mod orchestrator;

/// Wrapper descriptors and the registry scanner.
pub mod registry;

/// Pair selection and fee estimates.
pub mod quote;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `WrapClient` — the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{
        format_amount, parse_amount, AmountError, AmountValue, AssetAddress, Direction,
        TransactionHash,
    };

    // Errors
    pub use crate::error::{ContractError, ErrorKind, GatewayError, ProviderError, SdkError};

    // Envelope
    pub use crate::envelope::{EnvelopeError, ResultEnvelope};

    // Network
    pub use crate::network::{DEFAULT_REGISTRY_ADDRESS, DEFAULT_ROUTER_ADDRESS};

    // Provider
    pub use crate::provider::eth::TxReceipt;
    pub use crate::provider::RpcTransport;
    #[cfg(feature = "http")]
    pub use crate::provider::http::{HttpTransport, RetryConfig, RetryPolicy};
    #[cfg(feature = "wasm")]
    pub use crate::provider::injected::InjectedProvider;

    // Session + gateway
    pub use crate::abi::{ContractRole, Mutability};
    pub use crate::gateway::{ContractGateway, ContractProxy, PendingTransaction};
    pub use crate::session::{CallHandle, Identity, QueryHandle, WalletSession};

    // Protocols
    pub use crate::orchestrator::{
        AllowanceOrchestrator, Exchange, ExchangeRequest, ExchangeStage, ExchangeState,
    };
    pub use crate::quote::{ExchangePair, Quote};
    pub use crate::registry::{
        AssetMetadata, Fees, ScanReport, ScanWarning, SkippedWrapper, WrapperDescriptor,
        WrapperRegistryScanner,
    };

    // Client + sub-clients
    pub use crate::client::{Envelopes, WrapClient, WrapClientBuilder};
}
