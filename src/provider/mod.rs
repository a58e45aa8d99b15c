//! Provider layer: the EIP-1193 `request(method, params)` boundary.
//!
//! Everything the SDK needs from a wallet or node goes through one
//! [`RpcTransport::request`] call. The transport is compile-time selected:
//! - `http` feature → [`http::HttpTransport`] (JSON-RPC over HTTP)
//! - `wasm` feature → [`injected::InjectedProvider`] (`window.ethereum`)
//!
//! [`eth`] holds the typed JSON-RPC methods built on top of any transport.

pub mod eth;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "wasm")]
pub mod injected;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

/// A JSON-RPC capable endpoint: an injected wallet or a node URL.
///
/// Futures are `?Send` so the same trait object works on `wasm32`, where
/// JS handles cannot cross threads.
#[async_trait(?Send)]
pub trait RpcTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}
