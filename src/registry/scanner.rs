//! Registry scan: enumerate wrappers, then resolve each one's metadata.
//!
//! The registry list is fetched first; a failure there fails the whole scan
//! before any per-wrapper call. Per-wrapper work then runs concurrently
//! (bounded, order preserving). A wrapper whose lookups fail is skipped and
//! recorded in the [`ScanReport`]; it never fails the scan. A wrapper whose
//! lookups succeed is always kept; disagreements between its `info()` and
//! its assets are only reported as warnings.

use alloy_primitives::Address;
use futures_util::future::try_join;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing;

use crate::abi::{ContractRole, IFungibleAsset, IWrapper, IWrapperRegistry};
use crate::error::{ErrorKind, SdkError};
use crate::gateway::ContractGateway;
use crate::network::DEFAULT_SCAN_CONCURRENCY;
use crate::registry::{Fees, WrapperDescriptor};
use crate::session::QueryHandle;
use crate::shared::AssetAddress;

/// A wrapper left out of a scan, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedWrapper {
    pub wrapper: AssetAddress,
    pub reason: String,
}

impl SkippedWrapper {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PerWrapperSkipped
    }
}

/// A kept wrapper whose reported metadata looked inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanWarning {
    pub wrapper: AssetAddress,
    pub message: String,
}

/// Outcome of a scan: resolved descriptors in registry order, plus skips
/// and warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub descriptors: Vec<WrapperDescriptor>,
    pub skipped: Vec<SkippedWrapper>,
    pub warnings: Vec<ScanWarning>,
}

type Described = (WrapperDescriptor, Option<ScanWarning>);

#[derive(Debug, Clone)]
pub struct WrapperRegistryScanner {
    gateway: ContractGateway,
    concurrency: usize,
}

impl Default for WrapperRegistryScanner {
    fn default() -> Self {
        Self::new(ContractGateway::default(), DEFAULT_SCAN_CONCURRENCY)
    }
}

impl WrapperRegistryScanner {
    pub fn new(gateway: ContractGateway, concurrency: usize) -> Self {
        Self {
            gateway,
            concurrency: concurrency.max(1),
        }
    }

    /// Descriptors for every wrapper that resolved.
    pub async fn scan_all(
        &self,
        handle: &QueryHandle,
        registry: &AssetAddress,
    ) -> Result<Vec<WrapperDescriptor>, SdkError> {
        Ok(self.scan_with_report(handle, registry).await?.descriptors)
    }

    pub async fn scan_with_report(
        &self,
        handle: &QueryHandle,
        registry: &AssetAddress,
    ) -> Result<ScanReport, SdkError> {
        let factory = self
            .gateway
            .bind(registry, ContractRole::Registry, handle.clone())?;
        let wrappers = factory
            .call(&IWrapperRegistry::getAllWrapsCall {})
            .await
            .map_err(|e| e.into_sdk(SdkError::RegistryQuery))?
            ._0;

        tracing::debug!(registry = %registry, count = wrappers.len(), "scanning wrappers");

        let results: Vec<(Address, Result<Described, SdkError>)> =
            stream::iter(wrappers.into_iter().map(|wrapper| async move {
                (wrapper, self.describe(handle, wrapper).await)
            }))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = ScanReport::default();
        for (wrapper, result) in results {
            match result {
                Ok((descriptor, warning)) => {
                    if let Some(warning) = warning {
                        tracing::warn!(
                            wrapper = %warning.wrapper,
                            message = %warning.message,
                            "wrapper metadata mismatch"
                        );
                        report.warnings.push(warning);
                    }
                    report.descriptors.push(descriptor);
                }
                Err(e) => {
                    let skipped = SkippedWrapper {
                        wrapper: AssetAddress::from_address(wrapper),
                        reason: e.message(),
                    };
                    tracing::warn!(
                        wrapper = %skipped.wrapper,
                        kind = %skipped.kind(),
                        reason = %skipped.reason,
                        "skipping wrapper"
                    );
                    report.skipped.push(skipped);
                }
            }
        }
        Ok(report)
    }

    async fn describe(&self, handle: &QueryHandle, wrapper: Address) -> Result<Described, SdkError> {
        let wrapper_address = AssetAddress::from_address(wrapper);
        let info = self
            .gateway
            .bind(&wrapper_address, ContractRole::Wrapper, handle.clone())?
            .call(&IWrapper::infoCall {})
            .await
            .map_err(|e| e.into_sdk(SdkError::AssetQuery))?
            ._0;

        let ((d_symbol, d_decimals), (c_symbol, c_decimals)) = try_join(
            self.asset_metadata(handle, info.dTokenAddress),
            self.asset_metadata(handle, info.cAssetAddress),
        )
        .await?;

        // Amounts are scaled with the assets' own decimals.
        let warning = (d_decimals != info.dTokenDecimals || c_decimals != info.cAssetDecimals)
            .then(|| ScanWarning {
                wrapper: wrapper_address.clone(),
                message: format!(
                    "decimals mismatch: info reports {}/{}, assets report {}/{}",
                    info.dTokenDecimals, info.cAssetDecimals, d_decimals, c_decimals
                ),
            });

        let descriptor = WrapperDescriptor {
            wrapper: wrapper_address,
            d_token_address: AssetAddress::from_address(info.dTokenAddress),
            d_token_symbol: d_symbol,
            d_token_decimals: d_decimals,
            c_asset_address: AssetAddress::from_address(info.cAssetAddress),
            c_asset_symbol: c_symbol,
            c_asset_decimals: c_decimals,
            fees: Fees {
                in_bps: info.dTokenInFeeBps,
                out_bps: info.dTokenOutFeeBps,
            },
            d_token_treasury: AssetAddress::from_address(info.dTokenTreasury),
            c_asset_treasury: AssetAddress::from_address(info.cAssetTreasury),
        };
        Ok((descriptor, warning))
    }

    /// `symbol()` and `decimals()` of one asset, concurrently.
    async fn asset_metadata(
        &self,
        handle: &QueryHandle,
        asset: Address,
    ) -> Result<(String, u8), SdkError> {
        let proxy = self.gateway.bind(
            &AssetAddress::from_address(asset),
            ContractRole::FungibleAsset,
            handle.clone(),
        )?;
        let (symbol, decimals) = try_join(
            proxy.call(&IFungibleAsset::symbolCall {}),
            proxy.call(&IFungibleAsset::decimalsCall {}),
        )
        .await
        .map_err(|e| e.into_sdk(SdkError::AssetQuery))?;
        Ok((symbol._0, decimals._0))
    }
}
