//! Unified SDK error types.
//!
//! Every remote failure is converted into one of these types at the boundary
//! of the operation that issued it. [`SdkError::message`] and
//! [`SdkError::kind`] are what crosses a [`ResultEnvelope`](crate::envelope::ResultEnvelope).

use std::fmt;

use alloy_sol_types::{Revert, SolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::abi::{ContractRole, Mutability};
use crate::shared::amount::AmountError;

/// Message used when a failure carries no readable text at all.
pub const FALLBACK_MESSAGE: &str = "Unknown error";

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("MetaMask not installed")]
    ProviderMissing,

    #[error("User rejected the request")]
    UserRejected,

    #[error("Provider error: {0}")]
    Provider(ProviderError),

    #[error("Not connected")]
    NotConnected,

    #[error("{method} requires a signing identity")]
    NotSigned { method: String },

    #[error("Asset query failed: {0}")]
    AssetQuery(ContractError),

    #[error("Approval failed: {0}")]
    Approval(ContractError),

    #[error("Action failed: {0}")]
    Action(ContractError),

    #[error("Registry query failed: {0}")]
    RegistryQuery(ContractError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("timeout")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SdkError {
    /// Taxonomy tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::ProviderMissing => ErrorKind::ProviderMissing,
            SdkError::UserRejected => ErrorKind::UserRejected,
            SdkError::Provider(_) => ErrorKind::ProviderError,
            SdkError::NotConnected => ErrorKind::NotConnected,
            SdkError::NotSigned { .. } => ErrorKind::NotSigned,
            SdkError::AssetQuery(_) => ErrorKind::AssetQueryError,
            SdkError::Approval(_) => ErrorKind::ApprovalError,
            SdkError::Action(_) => ErrorKind::ActionError,
            SdkError::RegistryQuery(_) => ErrorKind::RegistryQueryError,
            SdkError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            SdkError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            SdkError::Timeout => ErrorKind::Timeout,
            SdkError::Serde(_) | SdkError::Other(_) => ErrorKind::Other,
        }
    }

    /// Best-effort human-readable message.
    ///
    /// Remote failures report their structured reason (e.g. a revert string)
    /// without the stage prefix; everything else uses its `Display` text.
    pub fn message(&self) -> String {
        let text = match self {
            SdkError::AssetQuery(e)
            | SdkError::Approval(e)
            | SdkError::Action(e)
            | SdkError::RegistryQuery(e) => e.to_string(),
            SdkError::Provider(e) => ContractError::from(e.clone()).to_string(),
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            text
        }
    }
}

impl From<ProviderError> for SdkError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            SdkError::UserRejected
        } else {
            SdkError::Provider(err)
        }
    }
}

// ─── ErrorKind ───────────────────────────────────────────────────────────────

/// Error taxonomy tag carried across the envelope boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ProviderMissing,
    UserRejected,
    ProviderError,
    NotConnected,
    NotSigned,
    AssetQueryError,
    ApprovalError,
    ActionError,
    RegistryQueryError,
    /// Diagnostic only; never the kind of a failed operation.
    PerWrapperSkipped,
    InvalidAmount,
    InvalidAddress,
    Timeout,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderMissing => "ProviderMissing",
            Self::UserRejected => "UserRejected",
            Self::ProviderError => "ProviderError",
            Self::NotConnected => "NotConnected",
            Self::NotSigned => "NotSigned",
            Self::AssetQueryError => "AssetQueryError",
            Self::ApprovalError => "ApprovalError",
            Self::ActionError => "ActionError",
            Self::RegistryQueryError => "RegistryQueryError",
            Self::PerWrapperSkipped => "PerWrapperSkipped",
            Self::InvalidAmount => "InvalidAmount",
            Self::InvalidAddress => "InvalidAddress",
            Self::Timeout => "Timeout",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── ProviderError ───────────────────────────────────────────────────────────

/// Transport and JSON-RPC level errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// A JSON-RPC / EIP-1193 error object.
    #[error("{message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Transport error: {message}")]
    Transport { message: String, retryable: bool },

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl ProviderError {
    /// EIP-1193 "user rejected the request".
    pub const USER_REJECTED_CODE: i64 = 4001;

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, ProviderError::Rpc { code, .. } if *code == Self::USER_REJECTED_CODE)
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            ProviderError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ─── ContractError ───────────────────────────────────────────────────────────

/// A remote call failure normalized into a single shape.
///
/// `reason` holds the contract's revert string (or a provider-reported
/// reason) and is preferred over `message` when displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub message: String,
    pub reason: Option<String>,
    pub code: Option<i64>,
}

impl ContractError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: None,
            code: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// A mined transaction whose receipt reports failure.
    pub fn reverted(tx_hash: &str) -> Self {
        Self::new(format!("transaction {} reverted", tx_hash))
    }

    pub fn best_message(&self) -> &str {
        if let Some(reason) = self.reason.as_deref().filter(|r| !r.trim().is_empty()) {
            return reason;
        }
        if !self.message.trim().is_empty() {
            return &self.message;
        }
        FALLBACK_MESSAGE
    }
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.best_message())
    }
}

impl std::error::Error for ContractError {}

impl From<ProviderError> for ContractError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rpc {
                code,
                message,
                data,
            } => {
                let reason = data
                    .as_ref()
                    .and_then(revert_reason)
                    .or_else(|| reason_from_message(&message));
                ContractError {
                    message,
                    reason,
                    code: Some(code),
                }
            }
            other => ContractError::new(other.to_string()),
        }
    }
}

/// Extract a revert reason from a JSON-RPC error `data` payload.
///
/// Wallets disagree on the shape: some send the raw revert bytes as a hex
/// string, some nest them under `data`, some (ethers-style) provide `reason`.
pub(crate) fn revert_reason(data: &Value) -> Option<String> {
    match data {
        Value::String(raw) => decode_revert_hex(raw),
        Value::Object(map) => map
            .get("reason")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .or_else(|| map.get("data").and_then(revert_reason)),
        _ => None,
    }
}

fn decode_revert_hex(raw: &str) -> Option<String> {
    let bytes = hex::decode(raw.trim_start_matches("0x")).ok()?;
    Revert::abi_decode(&bytes, true).ok().map(|r| r.reason)
}

fn reason_from_message(message: &str) -> Option<String> {
    message
        .strip_prefix("execution reverted: ")
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

// ─── GatewayError ────────────────────────────────────────────────────────────

/// Errors raised by a [`ContractProxy`](crate::gateway::ContractProxy).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// A mutating method on a proxy bound to a read-only handle.
    #[error("{method} requires a signing identity")]
    NotSigned { method: &'static str },

    /// The method is not declared (with this mutability) by the role's interface.
    #[error("{method} is not a {expected} method of the {role} interface")]
    UnknownMethod {
        role: ContractRole,
        method: &'static str,
        expected: Mutability,
    },

    #[error(transparent)]
    Remote(#[from] ContractError),
}

impl GatewayError {
    /// Convert into an [`SdkError`], classifying remote failures by `stage`.
    pub(crate) fn into_sdk(self, stage: fn(ContractError) -> SdkError) -> SdkError {
        match self {
            GatewayError::NotSigned { method } => SdkError::NotSigned {
                method: method.to_string(),
            },
            GatewayError::Remote(e) => stage(e),
            other @ GatewayError::UnknownMethod { .. } => SdkError::Other(other.to_string()),
        }
    }
}
