// Main entry point - Dependency injection and server setup
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};
use tokio::runtime::Handle;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use skogsnet_telemetry::application::polling::PollingController;
use skogsnet_telemetry::application::scheduler::TokioScheduler;
use skogsnet_telemetry::application::store::SharedStore;
use skogsnet_telemetry::infrastructure::config::load_settings;
use skogsnet_telemetry::infrastructure::http_source::HttpMeasurementSource;
use skogsnet_telemetry::presentation::app_state::AppState;
use skogsnet_telemetry::presentation::handlers::{get_dashboard, health_check, update_parameters};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let addr = settings.bind_addr()?;

    // Infrastructure
    let source = Arc::new(HttpMeasurementSource::new(settings.service.base_url.clone()));
    let scheduler = Arc::new(TokioScheduler::new(Handle::current()));

    // Application
    let controller = Arc::new(PollingController::new(
        source,
        SharedStore::new(),
        scheduler,
        settings.polling_config(),
    ));
    controller.start(settings.initial_range()?, settings.polling.live);

    let state = Arc::new(AppState {
        controller: controller.clone(),
        projector: settings.projector()?,
        colors: settings.chart.colors.clone(),
    });

    // Presentation
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/dashboard/parameters", put(update_parameters))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(%addr, upstream = %settings.service.base_url, "starting skogsnet dashboard");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.stop();
    tracing::info!("dashboard shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
