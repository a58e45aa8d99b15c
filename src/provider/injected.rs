//! Browser wallet transport using the injected `window.ethereum` object.
//!
//! Requests are marshalled through JSON on both sides: Rust `Value` →
//! `JSON.parse` → `ethereum.request(...)` → `JSON.stringify` → `Value`.
//! Rejections are decoded from the EIP-1193 error shape
//! `{ code, message, data }`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::ProviderError;
use crate::provider::RpcTransport;

/// Handle to the wallet injected into the page.
#[derive(Clone)]
pub struct InjectedProvider {
    ethereum: JsValue,
}

impl InjectedProvider {
    /// Look up `window.ethereum`. `None` when no wallet extension is present.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = js_sys::Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }
        Some(Self { ethereum })
    }

    fn request_fn(&self) -> Result<js_sys::Function, ProviderError> {
        js_sys::Reflect::get(&self.ethereum, &JsValue::from_str("request"))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| {
                ProviderError::Malformed("window.ethereum.request is not a function".to_string())
            })
    }
}

#[async_trait(?Send)]
impl RpcTransport for InjectedProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let args = to_js(&json!({ "method": method, "params": params }))?;
        let promise = self
            .request_fn()?
            .call1(&self.ethereum, &args)
            .map_err(|e| decode_rejection(&e))?;
        let promise: js_sys::Promise = promise
            .dyn_into()
            .map_err(|_| ProviderError::Malformed(format!("{} did not return a promise", method)))?;

        match JsFuture::from(promise).await {
            Ok(result) => from_js(&result),
            Err(err) => {
                let decoded = decode_rejection(&err);
                tracing::debug!(method, error = %decoded, "wallet request rejected");
                Err(decoded)
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn to_js(value: &Value) -> Result<JsValue, ProviderError> {
    let text = serde_json::to_string(value)
        .map_err(|e| ProviderError::Malformed(format!("request encode: {}", e)))?;
    js_sys::JSON::parse(&text)
        .map_err(|_| ProviderError::Malformed("request could not be parsed by JSON.parse".to_string()))
}

fn from_js(value: &JsValue) -> Result<Value, ProviderError> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Null);
    }
    let text = js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .ok_or_else(|| ProviderError::Malformed("response is not JSON-serializable".to_string()))?;
    serde_json::from_str(&text)
        .map_err(|e| ProviderError::Malformed(format!("response decode: {}", e)))
}

fn decode_rejection(err: &JsValue) -> ProviderError {
    let field = |name: &str| js_sys::Reflect::get(err, &JsValue::from_str(name)).ok();

    let code = field("code").and_then(|c| c.as_f64()).map(|c| c as i64);
    let message = field("message")
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_default();
    let data = field("data").and_then(|d| from_js(&d).ok()).filter(|d| !d.is_null());

    match code {
        Some(code) => ProviderError::Rpc {
            code,
            message,
            data,
        },
        None => ProviderError::Transport {
            message,
            retryable: false,
        },
    }
}
