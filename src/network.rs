//! Network constants for the wrap protocol deployment.

use std::time::Duration;

/// Wrapper factory (registry) address.
pub const DEFAULT_REGISTRY_ADDRESS: &str = "0xE521e9e0d066e7ba3702833E7B535Be6DE2fa41b";

/// Router that executes wrap/unwrap once it holds an allowance.
pub const DEFAULT_ROUTER_ADDRESS: &str = "0x7081cbaDb76F0df8eeB9889EFC821aFE6a451622";

/// Interval between `eth_getTransactionReceipt` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Wrappers resolved concurrently during a registry scan.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 8;
