use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use finsight_core::analysis::Analyzer;
use finsight_core::domain::analysis::AnalysisOutcome;
use finsight_core::domain::ticker::Ticker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsight_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider = reported(
        finsight_core::ingest::provider::from_settings(&settings)
            .context("failed to build price provider"),
    )?;
    let analyzer = Analyzer::new(provider, settings.analysis.clone());

    let state = AppState {
        analyzer: Arc::new(analyzer),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = reported(
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}")),
    )?;
    reported(
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("api server failed"),
    )?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/analysis/:ticker", get(get_analysis))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    analyzer: Arc<Analyzer>,
}

#[derive(Debug, Deserialize)]
struct AnalysisQuery {
    company: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiAnalysis {
    analysis_id: Uuid,
    provider: String,
    generated_at: DateTime<Utc>,
    outcome: AnalysisOutcome,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<(StatusCode, Json<ApiAnalysis>), (StatusCode, Json<ApiError>)> {
    let ticker = Ticker::parse(&ticker).map_err(|e| {
        tracing::info!(error = %e, "rejected analysis request");
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: e.to_string(),
            }),
        )
    })?;

    let analysis_id = Uuid::new_v4();
    let outcome = state
        .analyzer
        .analyze(&ticker, query.company.as_deref())
        .await;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    tracing::info!(%analysis_id, %ticker, status = status.as_u16(), "analysis served");

    Ok((
        status,
        Json(ApiAnalysis {
            analysis_id,
            provider: state.analyzer.provider_name().to_string(),
            generated_at: Utc::now(),
            outcome,
        }),
    ))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Send a failure to Sentry before handing it back to the caller.
fn reported<T>(result: anyhow::Result<T>) -> anyhow::Result<T> {
    result.map_err(|err| {
        sentry_anyhow::capture_anyhow(&err);
        err
    })
}

fn init_sentry(settings: &finsight_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
