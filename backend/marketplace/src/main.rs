//! EcoChain marketplace API entry point.
//!
//! Serves the listing document and wallet/transaction endpoints consumed by
//! the marketplace frontend. Submission goes through whichever signing
//! bridges are configured; confirmation is polled on the Aptos fullnode.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use marketplace::api::{self, ApiState};
use marketplace::config::Config;
use marketplace::node::AptosNodeClient;
use marketplace::submitter::Submitter;
use marketplace::wallet::{self, TransactionConfirmer, WalletContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    info!("Contract address: {}", config.contract_address);

    // HTTP client shared by the signer bridges and the fullnode client.
    let client = wallet::http_client()?;

    let node = Arc::new(
        AptosNodeClient::new(client.clone(), &config.node_url).with_polling(
            Duration::from_millis(config.confirm_poll_ms),
            config.confirm_max_polls,
        ),
    );

    let wallet = WalletContext::from_config(&config, &client);
    if wallet.available().is_empty() {
        warn!("No signer configured (DIRECT_SIGNER_URL / ADAPTER_SIGNER_URL); purchases will fail");
    }

    let confirmer = config
        .wait_for_confirmation
        .then(|| node.clone() as Arc<dyn TransactionConfirmer>);
    let submitter = Submitter::new(&config.contract_address, &config.default_price)
        .with_direct(wallet.direct())
        .with_adapter(wallet.adapter())
        .with_confirmer(confirmer);

    let state = Arc::new(ApiState {
        contract_address: config.contract_address.clone(),
        projects_file: config.projects_file.clone(),
        projects_fallback_file: config.projects_fallback_file.clone(),
        wallet,
        submitter,
        node: Some(node),
    });
    let app = api::router(state);

    // ─── Shutdown on Ctrl-C ───────────────────────────────
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
            shutdown.cancel();
        }
    });

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}
