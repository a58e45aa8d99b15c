//! In-memory fake chain speaking the JSON-RPC subset the SDK uses.
//!
//! Contracts are dispatched by address and 4-byte selector. Every call and
//! submission is recorded in order so tests can assert on sequencing.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use alloy_sol_types::{Revert, SolCall, SolError};
use async_trait::async_trait;
use serde_json::{json, Value};

use dfcs_wrap_sdk::abi::{IFungibleAsset, IWrapRouter, IWrapper, IWrapperRegistry, WrapperInfo};
use dfcs_wrap_sdk::error::ProviderError;
use dfcs_wrap_sdk::provider::RpcTransport;

pub const ALICE: &str = "0x1111111111111111111111111111111111111111";
pub const ROUTER: &str = "0x7081cbaDb76F0df8eeB9889EFC821aFE6a451622";
pub const REGISTRY: &str = "0xE521e9e0d066e7ba3702833E7B535Be6DE2fa41b";

pub fn addr(n: u64) -> Address {
    format!("0x{:040x}", n).parse().unwrap()
}

pub fn parse(s: &str) -> Address {
    s.parse().unwrap()
}

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Call { to: Address, method: &'static str },
    Send { to: Address, method: &'static str },
}

impl Event {
    pub fn method(&self) -> &'static str {
        match self {
            Event::Call { method, .. } | Event::Send { method, .. } => method,
        }
    }
}

#[derive(Debug, Clone)]
enum Fault {
    /// `eth_call` / `eth_sendTransaction` fails with revert data.
    Revert(String),
    /// The provider rejects the request with an error code.
    Reject(i64, String),
    /// The transaction is mined with status 0.
    MinedFailed,
}

#[derive(Debug, Clone)]
enum Contract {
    Token { symbol: String, decimals: u8 },
    Registry { wrappers: Vec<Address> },
    Wrapper { info: WrapperInfo },
    Router,
}

#[derive(Default)]
struct State {
    accounts: Option<Result<Vec<Address>, (i64, String)>>,
    contracts: HashMap<Address, Contract>,
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    faults: HashMap<(Address, &'static str), Fault>,
    receipts: HashMap<String, (bool, u32)>,
    pending_polls: u32,
    next_tx: u64,
    events: Vec<Event>,
    senders: Vec<Address>,
}

pub struct FakeChain {
    state: Mutex<State>,
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
        })
    }

    // ── Setup ────────────────────────────────────────────────────────────

    pub fn with_accounts(self: &Arc<Self>, accounts: &[&str]) -> Arc<Self> {
        self.state.lock().unwrap().accounts =
            Some(Ok(accounts.iter().map(|a| parse(a)).collect()));
        self.clone()
    }

    pub fn reject_accounts(self: &Arc<Self>, code: i64, message: &str) {
        self.state.lock().unwrap().accounts = Some(Err((code, message.to_string())));
    }

    pub fn add_token(&self, at: Address, symbol: &str, decimals: u8) {
        self.state.lock().unwrap().contracts.insert(
            at,
            Contract::Token {
                symbol: symbol.to_string(),
                decimals,
            },
        );
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state.lock().unwrap().balances.insert((token, owner), amount);
    }

    pub fn add_registry(&self, at: Address, wrappers: Vec<Address>) {
        self.state
            .lock()
            .unwrap()
            .contracts
            .insert(at, Contract::Registry { wrappers });
    }

    pub fn add_wrapper(&self, at: Address, info: WrapperInfo) {
        self.state
            .lock()
            .unwrap()
            .contracts
            .insert(at, Contract::Wrapper { info });
    }

    pub fn add_router(&self, at: Address) {
        self.state.lock().unwrap().contracts.insert(at, Contract::Router);
    }

    /// A wrapper between two fresh tokens; returns (wrapper, dToken, cAsset).
    pub fn add_pair(
        &self,
        seed: u64,
        d: (&str, u8),
        c: (&str, u8),
        fees: (u64, u64),
    ) -> (Address, Address, Address) {
        let wrapper = addr(seed * 10);
        let d_token = addr(seed * 10 + 1);
        let c_asset = addr(seed * 10 + 2);
        self.add_token(d_token, d.0, d.1);
        self.add_token(c_asset, c.0, c.1);
        self.add_wrapper(
            wrapper,
            WrapperInfo {
                dTokenAddress: d_token,
                cAssetAddress: c_asset,
                dTokenDecimals: d.1,
                cAssetDecimals: c.1,
                dTokenInFeeBps: U256::from(fees.0),
                dTokenOutFeeBps: U256::from(fees.1),
                dTokenTreasury: addr(seed * 10 + 3),
                cAssetTreasury: addr(seed * 10 + 4),
            },
        );
        (wrapper, d_token, c_asset)
    }

    pub fn revert(&self, at: Address, signature: &'static str, reason: &str) {
        self.fault(at, signature, Fault::Revert(reason.to_string()));
    }

    pub fn reject(&self, at: Address, signature: &'static str, code: i64, message: &str) {
        self.fault(at, signature, Fault::Reject(code, message.to_string()));
    }

    pub fn fail_mined(&self, at: Address, signature: &'static str) {
        self.fault(at, signature, Fault::MinedFailed);
    }

    /// Receipts stay pending for `polls` lookups before appearing.
    pub fn set_pending_polls(&self, polls: u32) {
        self.state.lock().unwrap().pending_polls = polls;
    }

    fn fault(&self, at: Address, signature: &'static str, fault: Fault) {
        self.state.lock().unwrap().faults.insert((at, signature), fault);
    }

    // ── Inspection ───────────────────────────────────────────────────────

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn sends(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Send { .. }))
            .collect()
    }

    /// The `from` address of every submitted transaction, in order.
    pub fn senders(&self) -> Vec<Address> {
        self.state.lock().unwrap().senders.clone()
    }

    pub fn calls_to(&self, at: Address) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Call { to, .. } | Event::Send { to, .. } if *to == at))
            .count()
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    fn dispatch(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            "eth_requestAccounts" => self.request_accounts(),
            "eth_chainId" => Ok(json!("0x4b9")),
            "eth_call" => self.eth_call(&params[0]),
            "eth_sendTransaction" => self.send_transaction(&params[0]),
            "eth_getTransactionReceipt" => self.receipt(&params[0]),
            other => Err(rpc(-32601, &format!("method {} not found", other), None)),
        }
    }

    fn request_accounts(&self) -> Result<Value, ProviderError> {
        match self.state.lock().unwrap().accounts.clone() {
            Some(Ok(accounts)) => Ok(json!(accounts
                .iter()
                .map(|a| a.to_string().to_lowercase())
                .collect::<Vec<_>>())),
            Some(Err((code, message))) => Err(rpc(code, &message, None)),
            None => Ok(json!([])),
        }
    }

    fn eth_call(&self, tx: &Value) -> Result<Value, ProviderError> {
        let (to, data) = decode_tx(tx);
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        let mut state = self.state.lock().unwrap();
        let signature = signature_of(selector);
        state.events.push(Event::Call { to, method: signature });

        if let Some(fault) = state.faults.get(&(to, signature)).cloned() {
            return Err(fault_error(&fault));
        }

        let out = match state.contracts.get(&to).cloned() {
            Some(Contract::Token { symbol, decimals }) => match selector {
                IFungibleAsset::symbolCall::SELECTOR => {
                    IFungibleAsset::symbolCall::abi_encode_returns(&(symbol,))
                }
                IFungibleAsset::decimalsCall::SELECTOR => {
                    IFungibleAsset::decimalsCall::abi_encode_returns(&(decimals,))
                }
                IFungibleAsset::balanceOfCall::SELECTOR => {
                    let call = IFungibleAsset::balanceOfCall::abi_decode(&data, true).unwrap();
                    let balance = state
                        .balances
                        .get(&(to, call.owner))
                        .copied()
                        .unwrap_or_default();
                    IFungibleAsset::balanceOfCall::abi_encode_returns(&(balance,))
                }
                _ => Vec::new(),
            },
            Some(Contract::Registry { wrappers }) => {
                IWrapperRegistry::getAllWrapsCall::abi_encode_returns(&(wrappers,))
            }
            Some(Contract::Wrapper { info }) => IWrapper::infoCall::abi_encode_returns(&(info,)),
            _ => Vec::new(),
        };
        Ok(json!(format!("0x{}", hex::encode(out))))
    }

    fn send_transaction(&self, tx: &Value) -> Result<Value, ProviderError> {
        let (to, data) = decode_tx(tx);
        let from = parse(tx["from"].as_str().unwrap());
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        let mut state = self.state.lock().unwrap();
        let signature = signature_of(selector);
        state.events.push(Event::Send { to, method: signature });
        state.senders.push(from);

        let mut success = true;
        match state.faults.get(&(to, signature)).cloned() {
            Some(Fault::MinedFailed) => success = false,
            Some(fault) => return Err(fault_error(&fault)),
            None => {}
        }

        if success {
            success = match selector {
                IFungibleAsset::approveCall::SELECTOR => {
                    let call = IFungibleAsset::approveCall::abi_decode(&data, true).unwrap();
                    state.allowances.insert((to, from, call.spender), call.amount);
                    true
                }
                IWrapRouter::wrapCall::SELECTOR => {
                    let call = IWrapRouter::wrapCall::abi_decode(&data, true).unwrap();
                    spend_allowance(&mut state, call.dToken, from, to, call.amount)
                }
                IWrapRouter::unwrapCall::SELECTOR => {
                    let call = IWrapRouter::unwrapCall::abi_decode(&data, true).unwrap();
                    spend_allowance(&mut state, call.cAsset, from, to, call.amount)
                }
                _ => false,
            };
        }

        state.next_tx += 1;
        let hash = format!("0x{:064x}", state.next_tx);
        let polls = state.pending_polls;
        state.receipts.insert(hash.clone(), (success, polls));
        Ok(json!(hash))
    }

    fn receipt(&self, hash: &Value) -> Result<Value, ProviderError> {
        let hash = hash.as_str().unwrap().to_string();
        let mut state = self.state.lock().unwrap();
        let Some((success, pending)) = state.receipts.get_mut(&hash) else {
            return Ok(Value::Null);
        };
        if *pending > 0 {
            *pending -= 1;
            return Ok(Value::Null);
        }
        Ok(json!({
            "transactionHash": hash,
            "blockNumber": "0x1",
            "status": if *success { "0x1" } else { "0x0" },
        }))
    }
}

#[async_trait(?Send)]
impl RpcTransport for FakeChain {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.dispatch(method, params)
    }
}

/// Holds `eth_call`s to a set of contracts until every one of them has a
/// call in flight, then lets them all through.
///
/// A caller that queries the contracts one after another never meets the
/// rendezvous; each held call gives up after about a second and `met()`
/// stays false.
pub struct Rendezvous {
    chain: Arc<FakeChain>,
    gated: Vec<Address>,
    arrived: Mutex<HashSet<Address>>,
    met: AtomicBool,
}

impl Rendezvous {
    pub fn new(chain: Arc<FakeChain>, gated: Vec<Address>) -> Arc<Self> {
        Arc::new(Self {
            chain,
            gated,
            arrived: Mutex::new(HashSet::new()),
            met: AtomicBool::new(false),
        })
    }

    pub fn met(&self) -> bool {
        self.met.load(Ordering::SeqCst)
    }

    fn all_arrived(&self) -> bool {
        self.arrived.lock().unwrap().len() == self.gated.len()
    }
}

#[async_trait(?Send)]
impl RpcTransport for Rendezvous {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        if method == "eth_call" {
            let (to, _) = decode_tx(&params[0]);
            if self.gated.contains(&to) && !self.met() {
                self.arrived.lock().unwrap().insert(to);
                for _ in 0..200 {
                    if self.all_arrived() {
                        self.met.store(true, Ordering::SeqCst);
                        break;
                    }
                    futures_timer::Delay::new(Duration::from_millis(5)).await;
                }
            }
        }
        self.chain.request(method, params).await
    }
}

fn spend_allowance(
    state: &mut State,
    token: Address,
    owner: Address,
    spender: Address,
    amount: U256,
) -> bool {
    let key = (token, owner, spender);
    let allowed = state.allowances.get(&key).copied().unwrap_or_default();
    if allowed < amount {
        return false;
    }
    state.allowances.insert(key, allowed - amount);
    true
}

fn decode_tx(tx: &Value) -> (Address, Vec<u8>) {
    let to = parse(tx["to"].as_str().unwrap());
    let data = hex::decode(tx["data"].as_str().unwrap().trim_start_matches("0x")).unwrap();
    (to, data)
}

fn signature_of(selector: [u8; 4]) -> &'static str {
    match selector {
        IFungibleAsset::symbolCall::SELECTOR => IFungibleAsset::symbolCall::SIGNATURE,
        IFungibleAsset::decimalsCall::SELECTOR => IFungibleAsset::decimalsCall::SIGNATURE,
        IFungibleAsset::balanceOfCall::SELECTOR => IFungibleAsset::balanceOfCall::SIGNATURE,
        IFungibleAsset::approveCall::SELECTOR => IFungibleAsset::approveCall::SIGNATURE,
        IWrapperRegistry::getAllWrapsCall::SELECTOR => IWrapperRegistry::getAllWrapsCall::SIGNATURE,
        IWrapper::infoCall::SELECTOR => IWrapper::infoCall::SIGNATURE,
        IWrapRouter::wrapCall::SELECTOR => IWrapRouter::wrapCall::SIGNATURE,
        IWrapRouter::unwrapCall::SELECTOR => IWrapRouter::unwrapCall::SIGNATURE,
        _ => "unknown",
    }
}

fn fault_error(fault: &Fault) -> ProviderError {
    match fault {
        Fault::Revert(reason) => {
            let data = Revert {
                reason: reason.clone(),
            }
            .abi_encode();
            rpc(3, "execution reverted", Some(json!(format!("0x{}", hex::encode(data)))))
        }
        Fault::Reject(code, message) => rpc(*code, message, None),
        Fault::MinedFailed => rpc(-32000, "unreachable", None),
    }
}

fn rpc(code: i64, message: &str, data: Option<Value>) -> ProviderError {
    ProviderError::Rpc {
        code,
        message: message.to_string(),
        data,
    }
}
