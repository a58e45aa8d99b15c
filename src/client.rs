//! High-level client — `WrapClient` with a builder and sub-client accessors.
//!
//! Every operation returns `Result<_, SdkError>`. The same operations are
//! available as [`ResultEnvelope`]s through `client.envelope()`.

use crate::abi::{ContractRole, IFungibleAsset};
use crate::envelope::ResultEnvelope;
use crate::error::SdkError;
use crate::gateway::ContractGateway;
use crate::network::{
    DEFAULT_POLL_INTERVAL, DEFAULT_REGISTRY_ADDRESS, DEFAULT_ROUTER_ADDRESS,
    DEFAULT_SCAN_CONCURRENCY,
};
use crate::orchestrator::{AllowanceOrchestrator, Exchange, ExchangeRequest};
use crate::provider::RpcTransport;
use crate::quote::{ExchangePair, Quote};
use crate::registry::{ScanReport, WrapperDescriptor, WrapperRegistryScanner};
use crate::session::{Identity, QueryHandle, WalletSession};
use crate::shared::{format_amount, AssetAddress, Direction, TransactionHash};

#[cfg(feature = "http")]
use crate::provider::http::{HttpTransport, RetryConfig};

use futures_util::future::{self, Either};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// The primary entry point for the wrap SDK.
pub struct WrapClient {
    pub(crate) session: WalletSession,
    /// Read-only transport used when no wallet is connected.
    pub(crate) reader: Option<QueryHandle>,
    pub(crate) gateway: ContractGateway,
    pub(crate) orchestrator: AllowanceOrchestrator,
    pub(crate) scanner: WrapperRegistryScanner,
    pub(crate) registry_address: AssetAddress,
    pub(crate) router_address: AssetAddress,
    pub(crate) operation_timeout: Option<Duration>,
}

impl WrapClient {
    pub fn builder() -> WrapClientBuilder {
        WrapClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn envelope(&self) -> Envelopes<'_> {
        Envelopes { client: self }
    }

    // ── Configuration ────────────────────────────────────────────────────

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn registry_address(&self) -> &AssetAddress {
        &self.registry_address
    }

    pub fn router_address(&self) -> &AssetAddress {
        &self.router_address
    }

    // ── Session ──────────────────────────────────────────────────────────

    /// Request wallet access; returns the connected account.
    pub async fn connect(&self) -> Result<AssetAddress, SdkError> {
        self.timed(async {
            let identity = self.session.connect().await?;
            Ok(identity.asset_address())
        })
        .await
    }

    /// The handle reads go through: the wallet when connected, else the
    /// read-only transport.
    pub async fn query_handle(&self) -> Result<QueryHandle, SdkError> {
        if let Some(query) = self.session.query().await {
            return Ok(query);
        }
        self.reader.clone().ok_or(SdkError::NotConnected)
    }

    pub async fn identity(&self) -> Result<Identity, SdkError> {
        self.session.identity().await.ok_or(SdkError::NotConnected)
    }

    // ── Reads ────────────────────────────────────────────────────────────

    /// Balance of `owner` in `asset`, formatted with the asset's decimals.
    ///
    /// `balanceOf` and `decimals` are fetched concurrently; if either fails
    /// the call fails.
    pub async fn balance(&self, owner: &AssetAddress, asset: &AssetAddress) -> Result<String, SdkError> {
        self.timed(async {
            let owner = owner.to_address()?;
            let proxy = self
                .gateway
                .bind(asset, ContractRole::FungibleAsset, self.query_handle().await?)?;
            let (balance, decimals) = future::try_join(
                proxy.call(&IFungibleAsset::balanceOfCall { owner }),
                proxy.call(&IFungibleAsset::decimalsCall {}),
            )
            .await
            .map_err(|e| e.into_sdk(SdkError::AssetQuery))?;
            Ok(format_amount(balance._0.into(), decimals._0))
        })
        .await
    }

    /// Every wrapper the registry lists that resolved successfully.
    pub async fn scan_wrappers(&self, registry: &AssetAddress) -> Result<Vec<WrapperDescriptor>, SdkError> {
        Ok(self.scan_report(registry).await?.descriptors)
    }

    /// Like [`scan_wrappers`](Self::scan_wrappers), plus the skipped wrappers.
    pub async fn scan_report(&self, registry: &AssetAddress) -> Result<ScanReport, SdkError> {
        self.timed(async {
            let handle = self.query_handle().await?;
            self.scanner.scan_with_report(&handle, registry).await
        })
        .await
    }

    /// Estimate the fee and output of exchanging `amount` over `pair`.
    pub fn quote(&self, pair: &ExchangePair, amount: &str) -> Result<Quote, SdkError> {
        pair.quote(amount)
    }

    // ── Exchanges ────────────────────────────────────────────────────────

    /// Approve `contract` for `amount` of `underlying`, then wrap it into
    /// `derivative`. Returns the confirmed wrap transaction hash.
    pub async fn wrap(
        &self,
        contract: &AssetAddress,
        underlying: &AssetAddress,
        amount: &str,
        derivative: &AssetAddress,
    ) -> Result<TransactionHash, SdkError> {
        self.timed(async {
            let identity = self.identity().await?;
            self.orchestrator
                .wrap(identity, contract, underlying, amount, derivative)
                .await
        })
        .await
    }

    /// Approve `contract` for `amount` of `derivative`, then unwrap it into
    /// `underlying`. Returns the confirmed unwrap transaction hash.
    pub async fn unwrap(
        &self,
        contract: &AssetAddress,
        derivative: &AssetAddress,
        amount: &str,
        underlying: &AssetAddress,
    ) -> Result<TransactionHash, SdkError> {
        self.timed(async {
            let identity = self.identity().await?;
            self.orchestrator
                .unwrap(identity, contract, derivative, amount, underlying)
                .await
        })
        .await
    }

    /// Wrap or unwrap through the configured router, per the pair's direction.
    pub async fn exchange(&self, pair: &ExchangePair, amount: &str) -> Result<TransactionHash, SdkError> {
        let router = &self.router_address;
        match pair.direction {
            Direction::Wrap => {
                self.wrap(router, &pair.from.address, amount, &pair.to.address)
                    .await
            }
            Direction::Unwrap => {
                self.unwrap(router, &pair.from.address, amount, &pair.to.address)
                    .await
            }
        }
    }

    /// An exchange over `pair` that the caller drives and inspects step by
    /// step. Not bounded by the operation timeout.
    pub async fn prepare_exchange(&self, pair: &ExchangePair, amount: &str) -> Result<Exchange, SdkError> {
        let identity = self.identity().await?;
        let request = ExchangeRequest {
            contract: self.router_address.clone(),
            spend_asset: pair.from.address.clone(),
            counter_asset: pair.to.address.clone(),
            amount: amount.to_string(),
            direction: pair.direction,
        };
        Ok(self.orchestrator.prepare(identity, request))
    }

    // ── Internal ─────────────────────────────────────────────────────────

    /// Bound `fut` by the operation timeout, if one is configured.
    ///
    /// A timed-out transaction may still be mined later.
    async fn timed<T, F>(&self, fut: F) -> Result<T, SdkError>
    where
        F: Future<Output = Result<T, SdkError>>,
    {
        let Some(limit) = self.operation_timeout else {
            return fut.await;
        };
        match future::select(Box::pin(fut), futures_timer::Delay::new(limit)).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => {
                tracing::debug!(timeout_ms = limit.as_millis() as u64, "operation timed out");
                Err(SdkError::Timeout)
            }
        }
    }
}

impl Clone for WrapClient {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            reader: self.reader.clone(),
            gateway: self.gateway.clone(),
            orchestrator: self.orchestrator.clone(),
            scanner: self.scanner.clone(),
            registry_address: self.registry_address.clone(),
            router_address: self.router_address.clone(),
            operation_timeout: self.operation_timeout,
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Envelope sub-client
// ═════════════════════════════════════════════════════════════════════════════

/// The public operations, each answering with a [`ResultEnvelope`].
pub struct Envelopes<'a> {
    pub(crate) client: &'a WrapClient,
}

impl<'a> Envelopes<'a> {
    pub async fn connect(&self) -> ResultEnvelope {
        self.client.connect().await.into()
    }

    pub async fn get_balance(&self, owner: &AssetAddress, asset: &AssetAddress) -> ResultEnvelope {
        self.client.balance(owner, asset).await.into()
    }

    pub async fn scan_wrappers(&self, registry: &AssetAddress) -> ResultEnvelope {
        self.client.scan_wrappers(registry).await.into()
    }

    pub async fn wrap(
        &self,
        contract: &AssetAddress,
        underlying: &AssetAddress,
        amount: &str,
        derivative: &AssetAddress,
    ) -> ResultEnvelope {
        self.client
            .wrap(contract, underlying, amount, derivative)
            .await
            .into()
    }

    pub async fn unwrap(
        &self,
        contract: &AssetAddress,
        derivative: &AssetAddress,
        amount: &str,
        underlying: &AssetAddress,
    ) -> ResultEnvelope {
        self.client
            .unwrap(contract, derivative, amount, underlying)
            .await
            .into()
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct WrapClientBuilder {
    #[cfg(feature = "http")]
    rpc_url: Option<String>,
    #[cfg(feature = "http")]
    retry: Option<RetryConfig>,
    reader: Option<Arc<dyn RpcTransport>>,
    wallet: Option<Arc<dyn RpcTransport>>,
    registry_address: String,
    router_address: String,
    poll_interval: Duration,
    operation_timeout: Option<Duration>,
    scan_concurrency: usize,
}

impl Default for WrapClientBuilder {
    fn default() -> Self {
        Self {
            #[cfg(feature = "http")]
            rpc_url: None,
            #[cfg(feature = "http")]
            retry: None,
            reader: None,
            wallet: None,
            registry_address: DEFAULT_REGISTRY_ADDRESS.to_string(),
            router_address: DEFAULT_ROUTER_ADDRESS.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            operation_timeout: None,
            scan_concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }
}

impl WrapClientBuilder {
    /// Read-only JSON-RPC endpoint used when no wallet is connected.
    #[cfg(feature = "http")]
    pub fn rpc_url(mut self, url: &str) -> Self {
        self.rpc_url = Some(url.to_string());
        self
    }

    /// Retry config for read methods of the `rpc_url` transport.
    #[cfg(feature = "http")]
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Read-only transport. Takes precedence over `rpc_url`.
    pub fn reader(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.reader = Some(transport);
        self
    }

    /// Wallet provider used by `connect` and for signing.
    pub fn wallet(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.wallet = Some(transport);
        self
    }

    /// Use the page's injected wallet, if there is one.
    #[cfg(feature = "wasm")]
    pub fn injected_wallet(mut self) -> Self {
        if let Some(provider) = crate::provider::injected::InjectedProvider::detect() {
            self.wallet = Some(Arc::new(provider));
        }
        self
    }

    pub fn registry_address(mut self, address: &str) -> Self {
        self.registry_address = address.to_string();
        self
    }

    pub fn router_address(mut self, address: &str) -> Self {
        self.router_address = address.to_string();
        self
    }

    /// Interval between receipt polls while waiting for a confirmation.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Upper bound on every client operation.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Wrappers resolved concurrently during a scan.
    pub fn scan_concurrency(mut self, n: usize) -> Self {
        self.scan_concurrency = n;
        self
    }

    pub fn build(self) -> Result<WrapClient, SdkError> {
        let registry_address = AssetAddress::new(self.registry_address);
        let router_address = AssetAddress::new(self.router_address);
        registry_address.to_address()?;
        router_address.to_address()?;

        #[cfg(feature = "http")]
        let reader = match (self.reader, self.rpc_url) {
            (Some(t), _) => Some(t),
            (None, Some(url)) => {
                let mut http = HttpTransport::new(&url)?;
                if let Some(config) = self.retry {
                    http = http.with_retry(config);
                }
                Some(Arc::new(http) as Arc<dyn RpcTransport>)
            }
            (None, None) => None,
        };
        #[cfg(not(feature = "http"))]
        let reader = self.reader;

        let gateway = ContractGateway::new(self.poll_interval);
        Ok(WrapClient {
            session: WalletSession::new(self.wallet),
            reader: reader.map(QueryHandle::new),
            orchestrator: AllowanceOrchestrator::new(gateway.clone()),
            scanner: WrapperRegistryScanner::new(gateway.clone(), self.scan_concurrency),
            gateway,
            registry_address,
            router_address,
            operation_timeout: self.operation_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builder_defaults() {
        let client = WrapClient::builder().build().unwrap();
        assert_eq!(client.registry_address().as_str(), DEFAULT_REGISTRY_ADDRESS);
        assert_eq!(client.router_address().as_str(), DEFAULT_ROUTER_ADDRESS);
        assert!(client.operation_timeout.is_none());
    }

    #[test]
    fn test_builder_rejects_bad_router() {
        let err = WrapClient::builder()
            .router_address("0xnope")
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    }

    #[tokio::test]
    async fn test_reads_without_any_transport_are_not_connected() {
        let client = WrapClient::builder().build().unwrap();
        let err = client
            .balance(&DEFAULT_ROUTER_ADDRESS.into(), &DEFAULT_REGISTRY_ADDRESS.into())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::NotConnected));
    }

    #[tokio::test]
    async fn test_connect_without_wallet_envelope() {
        let client = WrapClient::builder().build().unwrap();
        let env = client.envelope().connect().await;
        assert!(!env.ok);
        assert_eq!(env.value, "MetaMask not installed");
        assert_eq!(env.kind, Some(ErrorKind::ProviderMissing));
    }

    #[tokio::test]
    async fn test_wrap_without_identity_is_not_connected() {
        let client = WrapClient::builder().build().unwrap();
        let router: AssetAddress = DEFAULT_ROUTER_ADDRESS.into();
        let err = client.wrap(&router, &router, "1", &router).await.unwrap_err();
        assert!(matches!(err, SdkError::NotConnected));
    }
}
