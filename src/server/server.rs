use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tracing::info;

use crate::config::types::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::server::routes;
use crate::vendor::dispatcher::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub fanout_concurrency: usize,
    pub metrics_state: MetricsState,
}

/// Start the admin-facing HTTP server: the API routes plus the
/// optional metrics route, sharing one state.
pub async fn start(settings_config: &SettingsConfig, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let metrics = get_metrics().await;
    let state = AppState {
        dispatcher,
        fanout_concurrency: settings_config.fanout_concurrency,
        metrics_state: MetricsState::new(metrics.registry.clone()),
    };

    let app = Router::new()
        .merge(routes::router())
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state);

    let bind_addr = &settings_config.server.host;
    let port = &settings_config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port)).await?;
    info!("listening on {}:{}", bind_addr, port);
    metrics.up.set(1);
    axum::serve(listener, app).await?;

    Ok(())
}
