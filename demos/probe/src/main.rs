//! Query a Zabbix server from the command line.
//!
//! Starts the availability watcher, waits for the server to come up, makes a
//! single call and prints its result as JSON.
//!
//! Run:
//!   cargo run -p zabbix-rpc-example-probe -- --host zbx.example.com --user Admin --password zabbix host.get '{"output":["name"]}'
//!   cargo run -p zabbix-rpc-example-probe -- --config zabbix.toml apiinfo.version
//!
//! Set `RUST_LOG=zabbix_rpc_client=debug` to watch probes and logins.

use anyhow::{anyhow, Context};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use zabbix_rpc_client::{ClientConfig, ZabbixClient};

#[derive(Debug, Parser)]
#[command(name = "zabbix-probe", about = "Call a Zabbix JSON-RPC method")]
struct Args {
    /// TOML config file. Overrides the connection flags.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[arg(long, env = "ZABBIX_HOST", required_unless_present = "config")]
    host: Option<String>,

    #[arg(long, env = "ZABBIX_PORT", default_value = "")]
    port: String,

    /// Use https.
    #[arg(long, env = "ZABBIX_TLS")]
    tls: bool,

    #[arg(long, env = "ZABBIX_USER", default_value = "Admin")]
    user: String,

    #[arg(long, env = "ZABBIX_PASSWORD", default_value = "zabbix", hide_env_values = true)]
    password: String,

    /// How long to wait for the server to become available.
    #[arg(long, default_value_t = 30)]
    wait_secs: u64,

    /// RPC method, e.g. `host.get`.
    method: String,

    /// Params as JSON.
    #[arg(default_value = "{}")]
    params: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("zabbix_rpc_client=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => {
            let host = args.host.clone().context("--host is required without --config")?;
            ClientConfig::new(host, args.port.as_str(), args.tls, args.user.as_str(), args.password.as_str())
        }
    };
    let params: Value = serde_json::from_str(&args.params).context("params must be valid JSON")?;

    let client = ZabbixClient::new(&config)?;
    tracing::info!("Connecting to {}", client.base_url());
    client.authenticate();

    let outcome = run(&client, &args.method, &params, Duration::from_secs(args.wait_secs)).await;
    client.destroy().await;

    let result = outcome?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run(
    client: &ZabbixClient,
    method: &str,
    params: &Value,
    wait: Duration,
) -> anyhow::Result<Value> {
    tokio::time::timeout(wait, async {
        while !client.is_available() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await
    .map_err(|_| anyhow!("{} did not become available within {:?}", client.base_url(), wait))?;

    let response = client
        .call(params, method)
        .await
        .with_context(|| format!("{method} failed"))?;
    Ok(response.result.unwrap_or(Value::Null))
}
