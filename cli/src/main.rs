//! chainclient CLI — query Ethereum nodes from the terminal.
//!
//! Usage:
//! ```bash
//! # Latest block number, with a fallback endpoint
//! chainclient block-number --url https://cloudflare-eth.com --url https://eth.llamarpc.com
//!
//! # Send a raw JSON-RPC call
//! chainclient call --url https://cloudflare-eth.com --method eth_gasPrice
//!
//! # Probe each endpoint individually
//! chainclient test --url https://cloudflare-eth.com --url https://eth.llamarpc.com
//! ```
//!
//! Every command accepts `--url` more than once; endpoints are tried in the
//! order given, with retry rounds across the whole list. `RUST_LOG=debug`
//! shows per-attempt dispatch decisions.

use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use chainclient_core::{Client, Transport};
use chainclient_eth::{BlockNumberOrTag, EthClient};
use chainclient_http::HttpTransport;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "call" => cmd_call(&args[2..]).await,
        "balance" => cmd_balance(&args[2..]).await,
        "block-number" => cmd_block_number(&args[2..]).await,
        "chain-id" => cmd_chain_id(&args[2..]).await,
        "test" => cmd_test(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("chainclient {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainclient {}", env!("CARGO_PKG_VERSION"));
    println!("Query Ethereum nodes with ordered transport fallback\n");
    println!("USAGE:");
    println!("    chainclient <COMMAND> --url <URL> [--url <URL>…] [FLAGS]\n");
    println!("COMMANDS:");
    println!("    call          Send a raw JSON-RPC call");
    println!("    balance       Balance of an address in wei");
    println!("    block-number  Latest block number");
    println!("    chain-id      Chain id reported by the endpoint");
    println!("    test          Probe each endpoint (latency, block number)");
    println!("    version       Print version");
    println!("    help          Print this help\n");
    println!("COMMON FLAGS:");
    println!("    --url <URL>       HTTP endpoint; repeat for ordered fallback  [required]");
    println!("    --timeout <SECS>  Per-request timeout                         [default: 30]");
    println!("    --retries <N>     Retry rounds after the first pass           [default: 3]\n");
    println!("CALL FLAGS:");
    println!("    --method <NAME>   JSON-RPC method                             [required]");
    println!("    --params <JSON>   Positional params as a JSON array           [default: []]\n");
    println!("BALANCE FLAGS:");
    println!("    --address <ADDR>  Account to query                            [required]");
    println!("    --block <BLOCK>   Tag, decimal, or 0x-hex block               [default: latest]");
}

/// Build the dispatch client from the repeated `--url` flags plus the
/// shared timing flags.
fn build_client(args: &[String]) -> Result<Client, String> {
    let urls = parse_flag_all(args, "--url");
    if urls.is_empty() {
        return Err("--url is required".into());
    }

    let mut transports: Vec<Arc<dyn Transport>> = Vec::with_capacity(urls.len());
    for url in &urls {
        let transport = HttpTransport::new(url.clone()).map_err(|e| e.to_string())?;
        transports.push(Arc::new(transport));
    }

    let mut builder = Client::builder().transports(transports);
    if let Some(secs) = parse_flag(args, "--timeout") {
        let secs: u64 = secs.parse().map_err(|_| format!("invalid --timeout: {secs}"))?;
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(n) = parse_flag(args, "--retries") {
        let n: u32 = n.parse().map_err(|_| format!("invalid --retries: {n}"))?;
        builder = builder.retry_count(n);
    }

    builder.build().map_err(|e| e.to_string())
}

async fn cmd_call(args: &[String]) -> Result<(), String> {
    let method = parse_flag(args, "--method").ok_or("--method is required")?;
    let params = match parse_flag(args, "--params") {
        Some(json) => serde_json::from_str::<Vec<serde_json::Value>>(&json)
            .map_err(|e| format!("--params must be a JSON array: {e}"))?,
        None => Vec::new(),
    };

    let client = build_client(args)?;
    let raw = client
        .request(&method, params)
        .await
        .map_err(|e| e.to_string())?;

    let value: serde_json::Value =
        serde_json::from_str(raw.get()).map_err(|e| e.to_string())?;
    println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    Ok(())
}

async fn cmd_balance(args: &[String]) -> Result<(), String> {
    let address = parse_flag(args, "--address").ok_or("--address is required")?;
    let address: Address = address
        .parse()
        .map_err(|_| format!("invalid address: {address}"))?;
    let block = match parse_flag(args, "--block") {
        Some(block) => Some(block.parse::<BlockNumberOrTag>()?),
        None => None,
    };

    let eth = EthClient::new(build_client(args)?);
    let balance = eth
        .get_balance(address, block)
        .await
        .map_err(|e| e.to_string())?;

    println!("{balance}");
    Ok(())
}

async fn cmd_block_number(args: &[String]) -> Result<(), String> {
    let eth = EthClient::new(build_client(args)?);
    let number = eth.block_number().await.map_err(|e| e.to_string())?;
    println!("{number}");
    Ok(())
}

async fn cmd_chain_id(args: &[String]) -> Result<(), String> {
    let eth = EthClient::new(build_client(args)?);
    let id = eth.chain_id().await.map_err(|e| e.to_string())?;
    println!("{id}");
    Ok(())
}

/// Probe every endpoint on its own, without fallback, so a broken one is
/// visible instead of being papered over.
async fn cmd_test(args: &[String]) -> Result<(), String> {
    let urls = parse_flag_all(args, "--url");
    if urls.is_empty() {
        return Err("--url is required".into());
    }

    let mut failures = 0usize;
    for url in &urls {
        println!("Testing {url}...");
        match probe(url).await {
            Ok((block, latency)) => {
                println!("  Status:       OK");
                println!("  Block number: {block}");
                println!("  Latency:      {}ms", latency.as_millis());
            }
            Err(e) => {
                failures += 1;
                println!("  Status:       FAILED");
                println!("  Error:        {e}");
            }
        }
    }

    if failures > 0 {
        Err(format!("{failures} of {} endpoints failed", urls.len()))
    } else {
        Ok(())
    }
}

async fn probe(url: &str) -> Result<(u64, Duration), String> {
    let transport = HttpTransport::new(url).map_err(|e| e.to_string())?;
    let client = Client::builder()
        .transport(Arc::new(transport))
        .timeout(Duration::from_secs(10))
        .retry_count(0)
        .build()
        .map_err(|e| e.to_string())?;
    let eth = EthClient::new(client);

    let start = std::time::Instant::now();
    let block = eth.block_number().await.map_err(|e| e.to_string())?;
    Ok((block, start.elapsed()))
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

fn parse_flag_all(args: &[String], flag: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            if let Some(value) = iter.next() {
                values.push(value.clone());
            }
        }
    }
    values
}
