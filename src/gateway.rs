//! Typed contract calls: address + interface + handle → proxy.
//!
//! [`ContractGateway::bind`] does no network I/O. Every call made through the
//! resulting [`ContractProxy`] is checked against the interface registry for
//! the bound role before anything is sent, and every remote failure comes
//! back as a [`ContractError`].

use std::time::Duration;

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use tracing;

use crate::abi::{ContractRole, Mutability, INTERFACES};
use crate::error::{ContractError, GatewayError, SdkError};
use crate::network::DEFAULT_POLL_INTERVAL;
use crate::provider::eth::{self, TxReceipt};
use crate::session::CallHandle;
use crate::shared::{AssetAddress, TransactionHash};

/// Factory for [`ContractProxy`] values.
#[derive(Debug, Clone)]
pub struct ContractGateway {
    poll_interval: Duration,
}

impl Default for ContractGateway {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ContractGateway {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Bind `address` under `role` to a query handle or signer.
    ///
    /// Fails only if `address` is not a valid 20-byte hex address.
    pub fn bind(
        &self,
        address: &AssetAddress,
        role: ContractRole,
        handle: impl Into<CallHandle>,
    ) -> Result<ContractProxy, SdkError> {
        Ok(ContractProxy {
            address: address.to_address()?,
            role,
            handle: handle.into(),
            poll_interval: self.poll_interval,
        })
    }
}

/// A contract bound to a role and a handle.
#[derive(Debug, Clone)]
pub struct ContractProxy {
    address: Address,
    role: ContractRole,
    handle: CallHandle,
    poll_interval: Duration,
}

impl ContractProxy {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn role(&self) -> ContractRole {
        self.role
    }

    fn check<C: SolCall>(&self, expected: Mutability) -> Result<(), GatewayError> {
        if INTERFACES.get(self.role).declares::<C>(expected) {
            Ok(())
        } else {
            Err(GatewayError::UnknownMethod {
                role: self.role,
                method: C::SIGNATURE,
                expected,
            })
        }
    }

    /// Invoke a view method with a single `eth_call`.
    pub async fn call<C: SolCall>(&self, call: &C) -> Result<C::Return, GatewayError> {
        self.check::<C>(Mutability::View)?;

        let data = call.abi_encode();
        let raw = eth::call(self.handle.transport(), self.address, &data)
            .await
            .map_err(ContractError::from)?;

        C::abi_decode_returns(&raw, true).map_err(|e| {
            GatewayError::Remote(ContractError::new(format!(
                "{} on {} returned undecodable data: {}",
                C::SIGNATURE,
                self.address,
                e
            )))
        })
    }

    /// Submit a mutating method from the bound identity without waiting.
    pub async fn submit<C: SolCall>(&self, call: &C) -> Result<PendingTransaction, GatewayError> {
        self.check::<C>(Mutability::Mutating)?;
        let from = self.handle.signer().ok_or(GatewayError::NotSigned {
            method: C::SIGNATURE,
        })?;

        let data = call.abi_encode();
        let hash = eth::send_transaction(self.handle.transport(), from, self.address, &data)
            .await
            .map_err(ContractError::from)?;

        tracing::debug!(
            method = C::SIGNATURE,
            to = %self.address,
            tx = %hash,
            "transaction submitted"
        );

        Ok(PendingTransaction {
            hash,
            handle: self.handle.clone(),
            poll_interval: self.poll_interval,
        })
    }

    /// Submit and wait for the receipt.
    pub async fn send<C: SolCall>(&self, call: &C) -> Result<TxReceipt, GatewayError> {
        let pending = self.submit(call).await?;
        Ok(pending.confirm().await?)
    }
}

/// A submitted transaction awaiting its receipt.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    hash: TransactionHash,
    handle: CallHandle,
    poll_interval: Duration,
}

impl PendingTransaction {
    pub fn hash(&self) -> &TransactionHash {
        &self.hash
    }

    /// Poll until the transaction is mined. A failed status is a revert.
    pub async fn confirm(self) -> Result<TxReceipt, ContractError> {
        loop {
            match eth::transaction_receipt(self.handle.transport(), &self.hash).await? {
                Some(receipt) if receipt.succeeded() => {
                    tracing::info!(
                        tx = %receipt.transaction_hash,
                        block = ?receipt.block_number,
                        "transaction confirmed"
                    );
                    return Ok(receipt);
                }
                Some(_) => return Err(ContractError::reverted(self.hash.as_str())),
                None => futures_timer::Delay::new(self.poll_interval).await,
            }
        }
    }
}
