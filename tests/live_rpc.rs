//! Read-only checks against a live JSON-RPC endpoint.
//!
//! Requires `WRAP_RPC_URL` (in the environment or a `.env` file) pointing at
//! a node on the network the default registry is deployed to.
//!
//! All tests are `#[ignore]` because they require network access.
//!
//! Run with:
//! ```bash
//! cargo test --test live_rpc -- --ignored --nocapture
//! ```

use std::env;
use std::time::Duration;

use dfcs_wrap_sdk::prelude::*;
use dfcs_wrap_sdk::provider::eth;

fn rpc_url() -> Option<String> {
    dotenvy::dotenv().ok();
    env::var("WRAP_RPC_URL").ok()
}

fn client(url: &str) -> WrapClient {
    WrapClient::builder()
        .rpc_url(url)
        .operation_timeout(Duration::from_secs(60))
        .build()
        .expect("client should build")
}

#[tokio::test]
#[ignore]
async fn test_chain_id() {
    let Some(url) = rpc_url() else {
        println!("WRAP_RPC_URL not set, skipping");
        return;
    };
    let transport = HttpTransport::new(&url).expect("transport should build");
    let id = eth::chain_id(&transport).await.expect("eth_chainId");
    println!("chain id: {}", id);
}

#[tokio::test]
#[ignore]
async fn test_scan_default_registry() {
    let Some(url) = rpc_url() else {
        println!("WRAP_RPC_URL not set, skipping");
        return;
    };
    let client = client(&url);
    let report = client
        .scan_report(client.registry_address())
        .await
        .expect("scan should succeed");

    for d in &report.descriptors {
        println!(
            "{} {} ({}) ⇄ {} ({}) fees in={} out={}",
            d.wrapper.short(),
            d.d_token_symbol,
            d.d_token_decimals,
            d.c_asset_symbol,
            d.c_asset_decimals,
            d.fees.in_bps,
            d.fees.out_bps
        );
    }
    for s in &report.skipped {
        println!("skipped {}: {}", s.wrapper.short(), s.reason);
    }
}

#[tokio::test]
#[ignore]
async fn test_balance_of_router() {
    let Some(url) = rpc_url() else {
        println!("WRAP_RPC_URL not set, skipping");
        return;
    };
    let client = client(&url);
    let wrappers = client
        .scan_wrappers(client.registry_address())
        .await
        .expect("scan should succeed");
    let Some(first) = wrappers.first() else {
        println!("registry is empty");
        return;
    };

    let balance = client
        .balance(client.router_address(), &first.d_token_address)
        .await
        .expect("balance should succeed");
    println!("router holds {} {}", balance, first.d_token_symbol);
}
