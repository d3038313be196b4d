//! HTTP server for the Lectern assistant service
//!
//! Exposes the predict endpoint over axum. The transport contract is
//! deliberately minimal: a prompt in, a plain-text body out, streamed or
//! complete according to the process-wide stream flag. Engine errors map to
//! a generic server error.

use anyhow::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use lectern_core::service::PREDICTION_MEDIA_TYPE;
use lectern_core::{AssistantService, Prediction, ServiceConfig};
use log::LevelFilter;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Lectern Server - Run the assistant service")]
struct Cli {
    #[clap(long, default_value = "127.0.0.1:3000")]
    bind_addr: String,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    prompt: String,
}

async fn predict_handler(
    State(service): State<Arc<AssistantService>>,
    Json(request): Json<PredictRequest>,
) -> Response {
    match service.predict(&request.prompt).await {
        Ok(Prediction::Streaming(stream)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PREDICTION_MEDIA_TYPE)],
            Body::from_stream(stream),
        )
            .into_response(),
        Ok(Prediction::Complete(text)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PREDICTION_MEDIA_TYPE)],
            text,
        )
            .into_response(),
        Err(e) => {
            log::error!("Predict failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn tools_handler(State(service): State<Arc<AssistantService>>) -> Response {
    Json(service.tools()).into_response()
}

fn build_router(service: Arc<AssistantService>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/predict", post(predict_handler))
        .route("/tools", get(tools_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(service)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let config = ServiceConfig::from_env()?;
    log::info!(
        "Starting assistant service: service={} model={} stream={}",
        config.service,
        config.model_id,
        config.stream
    );

    let service = Arc::new(AssistantService::new(&config)?);
    let router = build_router(service);

    let bind_addr: SocketAddr = cli
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cli.bind_addr, e))?;

    log::info!("Listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
