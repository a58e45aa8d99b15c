//! Allowance-then-action exchange protocol shared by wrap and unwrap.
//!
//! ```text
//! Idle → DecimalsResolved → AllowanceGranted → ActionSubmitted → Confirmed
//!   └──────────────┴────────────────┴─────────────────┴──→ Failed { stage, message }
//! ```
//!
//! Each step waits for the previous one to be confirmed on chain. The
//! action is never submitted unless the approval receipt succeeded.

use std::fmt;

use serde::Serialize;
use tracing;

use crate::abi::{ContractRole, IFungibleAsset, IWrapRouter};
use crate::error::{ContractError, ErrorKind, SdkError};
use crate::gateway::{ContractGateway, ContractProxy, PendingTransaction};
use crate::session::Identity;
use crate::shared::{parse_amount, AmountError, AmountValue, AssetAddress, Direction, TransactionHash};

// ─── State ───────────────────────────────────────────────────────────────────

/// Step of the protocol a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStage {
    Decimals,
    Approval,
    Action,
}

impl fmt::Display for ExchangeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeStage::Decimals => write!(f, "decimals"),
            ExchangeStage::Approval => write!(f, "approval"),
            ExchangeStage::Action => write!(f, "action"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExchangeState {
    Idle,
    DecimalsResolved {
        decimals: u8,
        amount: AmountValue,
    },
    AllowanceGranted {
        approval_tx: TransactionHash,
    },
    ActionSubmitted {
        tx: TransactionHash,
    },
    Confirmed {
        tx_hash: TransactionHash,
    },
    Failed {
        stage: ExchangeStage,
        kind: ErrorKind,
        message: String,
    },
}

impl ExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangeState::Confirmed { .. } | ExchangeState::Failed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            ExchangeState::Idle => "idle",
            ExchangeState::DecimalsResolved { .. } => "decimals_resolved",
            ExchangeState::AllowanceGranted { .. } => "allowance_granted",
            ExchangeState::ActionSubmitted { .. } => "action_submitted",
            ExchangeState::Confirmed { .. } => "confirmed",
            ExchangeState::Failed { .. } => "failed",
        }
    }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// One exchange: spend `amount` of `spend_asset` through `contract`,
/// receiving `counter_asset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub contract: AssetAddress,
    pub spend_asset: AssetAddress,
    pub counter_asset: AssetAddress,
    /// Human-readable decimal amount, in units of `spend_asset`.
    pub amount: String,
    pub direction: Direction,
}

impl ExchangeRequest {
    /// Spend the underlying asset, receive the derivative.
    pub fn wrap(
        contract: impl Into<AssetAddress>,
        underlying: impl Into<AssetAddress>,
        amount: impl Into<String>,
        derivative: impl Into<AssetAddress>,
    ) -> Self {
        Self {
            contract: contract.into(),
            spend_asset: underlying.into(),
            counter_asset: derivative.into(),
            amount: amount.into(),
            direction: Direction::Wrap,
        }
    }

    /// Spend the derivative asset, receive the underlying.
    pub fn unwrap(
        contract: impl Into<AssetAddress>,
        derivative: impl Into<AssetAddress>,
        amount: impl Into<String>,
        underlying: impl Into<AssetAddress>,
    ) -> Self {
        Self {
            contract: contract.into(),
            spend_asset: derivative.into(),
            counter_asset: underlying.into(),
            amount: amount.into(),
            direction: Direction::Unwrap,
        }
    }
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Runs [`Exchange`]s for a signing identity.
#[derive(Debug, Clone, Default)]
pub struct AllowanceOrchestrator {
    gateway: ContractGateway,
}

impl AllowanceOrchestrator {
    pub fn new(gateway: ContractGateway) -> Self {
        Self { gateway }
    }

    /// An exchange in the `Idle` state; nothing happens until `run`.
    pub fn prepare(&self, identity: Identity, request: ExchangeRequest) -> Exchange {
        Exchange {
            gateway: self.gateway.clone(),
            identity,
            request,
            state: ExchangeState::Idle,
        }
    }

    pub async fn wrap(
        &self,
        identity: Identity,
        contract: &AssetAddress,
        underlying: &AssetAddress,
        amount: &str,
        derivative: &AssetAddress,
    ) -> Result<TransactionHash, SdkError> {
        let request = ExchangeRequest::wrap(
            contract.clone(),
            underlying.clone(),
            amount,
            derivative.clone(),
        );
        self.prepare(identity, request).run().await
    }

    pub async fn unwrap(
        &self,
        identity: Identity,
        contract: &AssetAddress,
        derivative: &AssetAddress,
        amount: &str,
        underlying: &AssetAddress,
    ) -> Result<TransactionHash, SdkError> {
        let request = ExchangeRequest::unwrap(
            contract.clone(),
            derivative.clone(),
            amount,
            underlying.clone(),
        );
        self.prepare(identity, request).run().await
    }
}

/// A single allowance-then-action run.
#[derive(Debug)]
pub struct Exchange {
    gateway: ContractGateway,
    identity: Identity,
    request: ExchangeRequest,
    state: ExchangeState,
}

impl Exchange {
    pub fn state(&self) -> &ExchangeState {
        &self.state
    }

    pub fn request(&self) -> &ExchangeRequest {
        &self.request
    }

    /// Drive the exchange to a terminal state.
    ///
    /// On success returns the hash of the confirmed action transaction.
    pub async fn run(&mut self) -> Result<TransactionHash, SdkError> {
        if !matches!(self.state, ExchangeState::Idle) {
            return Err(SdkError::Other(format!(
                "exchange already ran (state: {})",
                self.state.name()
            )));
        }

        match self.execute().await {
            Ok(hash) => Ok(hash),
            Err((stage, err)) => {
                tracing::debug!(
                    direction = %self.request.direction,
                    from = self.state.name(),
                    %stage,
                    error = %err,
                    "exchange failed"
                );
                self.state = ExchangeState::Failed {
                    stage,
                    kind: err.kind(),
                    message: err.message(),
                };
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: ExchangeState) {
        tracing::debug!(
            direction = %self.request.direction,
            from = self.state.name(),
            to = next.name(),
            "exchange transition"
        );
        self.state = next;
    }

    async fn execute(&mut self) -> Result<TransactionHash, (ExchangeStage, SdkError)> {
        use ExchangeStage::{Action, Approval, Decimals};

        // Bind everything up front so a malformed address fails before any
        // call is made.
        let asset = self
            .gateway
            .bind(&self.request.spend_asset, ContractRole::FungibleAsset, self.identity.clone())
            .map_err(|e| (Decimals, e))?;
        let router = self
            .gateway
            .bind(&self.request.contract, ContractRole::Router, self.identity.clone())
            .map_err(|e| (Decimals, e))?;
        let counter = self
            .request
            .counter_asset
            .to_address()
            .map_err(|e| (Decimals, e))?;

        // Idle → DecimalsResolved
        let decimals = asset
            .call(&IFungibleAsset::decimalsCall {})
            .await
            .map_err(|e| (Decimals, e.into_sdk(SdkError::AssetQuery)))?
            ._0;
        let amount = parse_amount(&self.request.amount, decimals)
            .map_err(|e| (Decimals, SdkError::from(e)))?;
        if amount.is_zero() {
            return Err((Decimals, SdkError::InvalidAmount(AmountError::ZeroAmount)));
        }
        self.transition(ExchangeState::DecimalsResolved { decimals, amount });

        // DecimalsResolved → AllowanceGranted
        let approval = asset
            .send(&IFungibleAsset::approveCall {
                spender: router.address(),
                amount: amount.raw(),
            })
            .await
            .map_err(|e| (Approval, e.into_sdk(SdkError::Approval)))?;
        self.transition(ExchangeState::AllowanceGranted {
            approval_tx: approval.transaction_hash,
        });

        // AllowanceGranted → ActionSubmitted → Confirmed
        let pending = self
            .submit_action(&router, amount, counter)
            .await
            .map_err(|e| (Action, e))?;
        self.transition(ExchangeState::ActionSubmitted {
            tx: pending.hash().clone(),
        });

        let receipt = pending
            .confirm()
            .await
            .map_err(|e: ContractError| (Action, SdkError::Action(e)))?;
        let tx_hash = receipt.transaction_hash;
        self.transition(ExchangeState::Confirmed {
            tx_hash: tx_hash.clone(),
        });
        Ok(tx_hash)
    }

    async fn submit_action(
        &self,
        router: &ContractProxy,
        amount: AmountValue,
        counter: alloy_primitives::Address,
    ) -> Result<PendingTransaction, SdkError> {
        let spend = self.request.spend_asset.to_address()?;
        let submitted = match self.request.direction {
            Direction::Wrap => {
                router
                    .submit(&IWrapRouter::wrapCall {
                        dToken: spend,
                        amount: amount.raw(),
                        cAsset: counter,
                    })
                    .await
            }
            Direction::Unwrap => {
                router
                    .submit(&IWrapRouter::unwrapCall {
                        cAsset: spend,
                        amount: amount.raw(),
                        dToken: counter,
                    })
                    .await
            }
        };
        submitted.map_err(|e| e.into_sdk(SdkError::Action))
    }
}
