//! Wallet session: who queries and who signs.
//!
//! A [`WalletSession`] starts uninitialized (or read-only) and becomes
//! connected after [`WalletSession::connect`]. Handles are handed out as
//! clones, so a reconnect never invalidates an operation already in flight.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::Address;
use async_lock::RwLock;
use tracing;

use crate::error::{ProviderError, SdkError};
use crate::provider::{eth, RpcTransport};
use crate::shared::AssetAddress;

// ─── Handles ─────────────────────────────────────────────────────────────────

/// Handle for read-only chain queries.
#[derive(Clone)]
pub struct QueryHandle {
    transport: Arc<dyn RpcTransport>,
}

impl QueryHandle {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &dyn RpcTransport {
        self.transport.as_ref()
    }
}

impl fmt::Debug for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHandle").finish_non_exhaustive()
    }
}

/// A connected account able to sign transactions.
#[derive(Clone)]
pub struct Identity {
    address: Address,
    transport: Arc<dyn RpcTransport>,
}

impl Identity {
    pub fn new(address: Address, transport: Arc<dyn RpcTransport>) -> Self {
        Self { address, transport }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn asset_address(&self) -> AssetAddress {
        AssetAddress::from_address(self.address)
    }

    /// The read-only view of the same provider.
    pub fn query(&self) -> QueryHandle {
        QueryHandle::new(self.transport.clone())
    }

    pub fn transport(&self) -> &dyn RpcTransport {
        self.transport.as_ref()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// What a contract proxy is bound to: a query handle or a signer.
#[derive(Debug, Clone)]
pub enum CallHandle {
    Query(QueryHandle),
    Signer(Identity),
}

impl CallHandle {
    pub fn transport(&self) -> &dyn RpcTransport {
        match self {
            CallHandle::Query(q) => q.transport(),
            CallHandle::Signer(i) => i.transport(),
        }
    }

    /// The signing account, if any.
    pub fn signer(&self) -> Option<Address> {
        match self {
            CallHandle::Query(_) => None,
            CallHandle::Signer(i) => Some(i.address()),
        }
    }
}

impl From<QueryHandle> for CallHandle {
    fn from(q: QueryHandle) -> Self {
        CallHandle::Query(q)
    }
}

impl From<Identity> for CallHandle {
    fn from(i: Identity) -> Self {
        CallHandle::Signer(i)
    }
}

// ─── WalletSession ───────────────────────────────────────────────────────────

#[derive(Default)]
struct SessionState {
    query: Option<QueryHandle>,
    identity: Option<Identity>,
}

/// Holds the current query handle and signing identity.
///
/// `connect` is the only writer; `identity()` and `query()` are readers.
#[derive(Clone)]
pub struct WalletSession {
    wallet: Option<Arc<dyn RpcTransport>>,
    state: Arc<RwLock<SessionState>>,
}

impl WalletSession {
    /// A session over an optional wallet provider. `None` means no wallet
    /// was detected; `connect` will then fail with `ProviderMissing`.
    pub fn new(wallet: Option<Arc<dyn RpcTransport>>) -> Self {
        Self {
            wallet,
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    /// A session that can only query, through `transport`.
    pub fn read_only(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            wallet: None,
            state: Arc::new(RwLock::new(SessionState {
                query: Some(QueryHandle::new(transport)),
                identity: None,
            })),
        }
    }

    /// Request account access from the wallet.
    ///
    /// Calling again re-requests access and replaces the identity.
    pub async fn connect(&self) -> Result<Identity, SdkError> {
        let wallet = self.wallet.clone().ok_or(SdkError::ProviderMissing)?;

        let accounts = eth::request_accounts(wallet.as_ref()).await?;
        let address = accounts.into_iter().next().ok_or_else(|| {
            SdkError::Provider(ProviderError::Malformed(
                "wallet returned no accounts".to_string(),
            ))
        })?;

        let identity = Identity::new(address, wallet.clone());
        {
            let mut state = self.state.write().await;
            state.query = Some(QueryHandle::new(wallet));
            state.identity = Some(identity.clone());
        }

        tracing::info!(address = %address, "wallet connected");
        Ok(identity)
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.identity.clone()
    }

    pub async fn query(&self) -> Option<QueryHandle> {
        self.state.read().await.query.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.identity.is_some()
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("has_wallet", &self.wallet.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct Accounts(Mutex<Vec<Result<Value, ProviderError>>>);

    #[async_trait(?Send)]
    impl RpcTransport for Accounts {
        async fn request(&self, method: &str, _params: Value) -> Result<Value, ProviderError> {
            assert_eq!(method, "eth_requestAccounts");
            self.0.lock().unwrap().remove(0)
        }
    }

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";

    fn session(responses: Vec<Result<Value, ProviderError>>) -> WalletSession {
        WalletSession::new(Some(Arc::new(Accounts(Mutex::new(responses)))))
    }

    #[tokio::test]
    async fn test_connect_without_provider() {
        let session = WalletSession::new(None);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, SdkError::ProviderMissing));
        assert_eq!(err.to_string(), "MetaMask not installed");
        assert!(session.identity().await.is_none());
    }

    #[tokio::test]
    async fn test_connect_establishes_identity_and_query() {
        let session = session(vec![Ok(json!([ALICE]))]);
        assert!(session.query().await.is_none());

        let identity = session.connect().await.unwrap();
        assert_eq!(identity.address(), ALICE.parse::<Address>().unwrap());
        assert!(session.is_connected().await);
        assert!(session.query().await.is_some());
    }

    #[tokio::test]
    async fn test_user_rejection() {
        let session = session(vec![Err(ProviderError::Rpc {
            code: 4001,
            message: "User rejected the request.".to_string(),
            data: None,
        })]);
        assert!(matches!(
            session.connect().await,
            Err(SdkError::UserRejected)
        ));
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_empty_account_list_is_provider_error() {
        let session = session(vec![Ok(json!([]))]);
        assert!(matches!(
            session.connect().await,
            Err(SdkError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn test_reconnect_keeps_old_handles_valid() {
        let session = session(vec![Ok(json!([ALICE])), Ok(json!([BOB]))]);
        let first = session.connect().await.unwrap();
        let second = session.connect().await.unwrap();

        assert_eq!(first.address(), ALICE.parse::<Address>().unwrap());
        assert_eq!(second.address(), BOB.parse::<Address>().unwrap());
        assert_eq!(session.identity().await.unwrap().address(), second.address());
    }

    #[tokio::test]
    async fn test_read_only_session() {
        let session = WalletSession::read_only(Arc::new(Accounts(Mutex::new(vec![]))));
        assert!(session.query().await.is_some());
        assert!(session.identity().await.is_none());
        assert!(matches!(
            session.connect().await,
            Err(SdkError::ProviderMissing)
        ));
    }
}
