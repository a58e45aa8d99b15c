//! `ResultEnvelope`: success or failure as plain data.
//!
//! Used where a result crosses a trust or process boundary (a JS host, a
//! message channel). `ok=true` carries the JSON-serialized success value in
//! `value`; `ok=false` carries a human-readable message and an [`ErrorKind`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, SdkError, FALLBACK_MESSAGE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub ok: bool,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ResultEnvelope {
    pub fn success<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => Self {
                ok: true,
                value: json,
                kind: None,
            },
            Err(e) => Self::failure(&SdkError::Serde(e)),
        }
    }

    pub fn failure(err: &SdkError) -> Self {
        let message = err.message();
        Self {
            ok: false,
            value: if message.trim().is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                message
            },
            kind: Some(err.kind()),
        }
    }

    pub fn from_result<T: Serialize>(result: Result<T, SdkError>) -> Self {
        match result {
            Ok(value) => Self::success(&value),
            Err(e) => Self::failure(&e),
        }
    }

    /// Read an envelope back on the consumer side.
    ///
    /// A failure envelope comes back as [`EnvelopeError`] carrying the
    /// transmitted message and kind.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, EnvelopeError> {
        if self.ok {
            serde_json::from_str(&self.value).map_err(|e| EnvelopeError {
                kind: ErrorKind::Other,
                message: format!("Malformed envelope value: {}", e),
            })
        } else {
            Err(EnvelopeError {
                kind: self.kind.unwrap_or(ErrorKind::Other),
                message: self.value,
            })
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of a bool and strings always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"ok":false,"value":"{}"}}"#, FALLBACK_MESSAGE)
        })
    }
}

impl<T: Serialize> From<Result<T, SdkError>> for ResultEnvelope {
    fn from(result: Result<T, SdkError>) -> Self {
        Self::from_result(result)
    }
}

/// A failure received through an envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct EnvelopeError {
    pub kind: ErrorKind,
    pub message: String,
}
