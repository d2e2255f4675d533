use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use lockbridge::config::loader::load_config;
use lockbridge::credentials::manager::TokenManager;
use lockbridge::credentials::store::CredentialStore;
use lockbridge::helpers::time::token_safety_margin_seconds;
use lockbridge::resilience::retry::RetrySettings;
use lockbridge::server;
use lockbridge::utils::logging;
use lockbridge::utils::logging::LogLevel;
use lockbridge::vendor::dispatcher::Dispatcher;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "lockbridge.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read args, load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = load_config(&args.config)?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Create the vendor HTTP client with a bounded timeout
    // -------------------------------

    let client = Client::builder()
        .timeout(Duration::from_secs(
            service_config.vendor.request_timeout_seconds,
        ))
        .build()?;

    // -------------------------------
    // 3. Restore persisted credentials and build the lifecycle manager
    // -------------------------------

    let store = CredentialStore::new(&service_config.credentials.path);
    let safety_margin = token_safety_margin_seconds(service_config.settings.safety_margin_seconds);
    let manager = Arc::new(
        TokenManager::new(client.clone(), &service_config.vendor, store, safety_margin).await?,
    );

    // -------------------------------
    // 4. Build the request dispatcher
    // -------------------------------

    let retry = RetrySettings::from_config(&service_config.settings.retry);
    let dispatcher = Arc::new(Dispatcher::new(
        client,
        &service_config.vendor,
        manager,
        retry,
    ));

    // -------------------------------
    // 5. Serve the admin API (and metrics, when enabled)
    // -------------------------------

    info!("Service starting...");
    server::server::start(&service_config.settings, dispatcher).await?;

    Ok(())
}
