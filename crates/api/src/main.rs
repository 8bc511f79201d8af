use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nepse_core::bands::load_band_table;
use nepse_core::classify::Thresholds;
use nepse_core::domain::signal::Snapshot;
use nepse_core::error::TrackerError;
use nepse_core::ingest::{QuoteSource, ShareSansarClient};
use nepse_core::pipeline::run_snapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = nepse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let client = ShareSansarClient::from_settings(&settings)?;
    tracing::info!(url = client.url(), bands_path = %settings.bands_path, "serving snapshots");

    let state = AppState {
        bands_path: Arc::from(settings.bands_path.as_str()),
        source: Arc::new(client),
        thresholds: settings.thresholds(),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/snapshot", get(get_snapshot))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    /// Re-read on every snapshot so edits to the band file apply without a restart.
    bands_path: Arc<str>,
    source: Arc<dyn QuoteSource>,
    thresholds: Thresholds,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
}

async fn get_snapshot(State(state): State<AppState>) -> ApiResult<Snapshot> {
    let path = state.bands_path.clone();
    let bands = tokio::task::spawn_blocking(move || load_band_table(&*path))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "band store load task failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "band store load task failed")
        })?
        .map_err(|e| error_response(e.into()))?;

    match run_snapshot(state.source.as_ref(), &bands, &state.thresholds).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(err) => Err(error_response(err)),
    }
}

fn error_response(err: TrackerError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        TrackerError::EmptyQuoteResult => StatusCode::SERVICE_UNAVAILABLE,
        TrackerError::QuoteFetch(_) => StatusCode::BAD_GATEWAY,
        TrackerError::BandStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if err.is_warning() {
        tracing::warn!(error = %err, "snapshot request produced no data");
        return api_error(status, err.to_string());
    }

    let err = anyhow::Error::new(err);
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "snapshot request failed");
    api_error(status, format!("{err:#}"))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &nepse_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nepse_core::domain::market::Quote;
    use nepse_core::error::QuoteFetchError;
    use nepse_core::ingest::provider::StaticQuoteSource;
    use std::path::PathBuf;

    const BANDS_CSV: &str = "Symbol,Bottom,High,ATH,ATL\nABC,80,100,120,70\n";

    struct DownSource;

    #[async_trait::async_trait]
    impl QuoteSource for DownSource {
        fn source_name(&self) -> &'static str {
            "down"
        }

        async fn fetch_quotes(&self) -> Result<Vec<Quote>, QuoteFetchError> {
            Err(QuoteFetchError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
            })
        }
    }

    fn band_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("nepse_api_{}_{name}.csv", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn state(source: Arc<dyn QuoteSource>, bands_path: &std::path::Path) -> AppState {
        AppState {
            bands_path: Arc::from(bands_path.to_str().unwrap()),
            source,
            thresholds: Thresholds::default(),
        }
    }

    fn breakout_source() -> Arc<dyn QuoteSource> {
        Arc::new(StaticQuoteSource::new(vec![Quote::new("ABC", Some(105.0))]))
    }

    #[tokio::test]
    async fn snapshot_returns_classified_tables() {
        let path = band_file("classified", BANDS_CSV);
        let Json(snapshot) = get_snapshot(State(state(breakout_source(), &path)))
            .await
            .unwrap();
        assert_eq!(snapshot.signals.breakouts.len(), 1);
        assert_eq!(snapshot.signals.breakouts[0].symbol, "ABC");
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_band_file_is_internal_error() {
        let path = std::env::temp_dir().join(format!("nepse_api_{}_absent.csv", std::process::id()));
        let (status, Json(body)) = get_snapshot(State(state(breakout_source(), &path)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error.contains("band store"));
    }

    #[tokio::test]
    async fn band_file_is_reloaded_per_request() {
        let path = band_file("reloaded", "Symbol,Bottom\nABC,80\n");
        let app = state(breakout_source(), &path);

        let (status, _) = get_snapshot(State(app.clone())).await.unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        std::fs::write(&path, BANDS_CSV).unwrap();
        let Json(snapshot) = get_snapshot(State(app)).await.unwrap();
        assert_eq!(snapshot.bands_loaded, 1);
        assert_eq!(snapshot.signals.breakouts[0].symbol, "ABC");
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn empty_quotes_map_to_service_unavailable() {
        let path = band_file("empty_quotes", BANDS_CSV);
        let source = Arc::new(StaticQuoteSource::default());
        let (status, Json(body)) = get_snapshot(State(state(source, &path)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.contains("no live data"));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn fetch_errors_map_to_bad_gateway() {
        let path = band_file("down", BANDS_CSV);
        let (status, _) = get_snapshot(State(state(Arc::new(DownSource), &path)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let _ = std::fs::remove_file(path);
    }
}
