use anyhow::Context;
use clap::Parser;
use nepse_core::bands::load_band_table;
use nepse_core::error::TrackerError;
use nepse_core::ingest::ShareSansarClient;
use nepse_core::pipeline::run_snapshot;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Debug, Parser)]
#[command(name = "nepse_worker", about = "Classify live NEPSE prices against reference bands")]
struct Args {
    /// Reference band file (.xlsx, .xls, .ods or .csv). Defaults to BANDS_PATH, then data.xlsx.
    #[arg(long)]
    bands: Option<String>,

    /// Live trading page URL. Defaults to LIVE_TRADING_URL, then the ShareSansar page.
    #[arg(long)]
    url: Option<String>,

    /// Print the snapshot as JSON instead of text tables.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse first so --help and argument errors never depend on the environment.
    let args = Args::parse();
    let mut settings = nepse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    if let Some(bands) = args.bands {
        settings.bands_path = bands;
    }
    if let Some(url) = args.url {
        settings.live_trading_url = url;
    }

    let bands = match load_band_table(&settings.bands_path).map_err(TrackerError::from) {
        Ok(bands) => bands,
        Err(err) => {
            let err = anyhow::Error::new(err).context("error loading band store");
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
    };

    let source =
        ShareSansarClient::from_settings(&settings).context("failed to build live quote client")?;
    tracing::info!(url = source.url(), "fetching live trading table");

    match run_snapshot(&source, &bands, &settings.thresholds()).await {
        Ok(snapshot) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", render::render_snapshot(&snapshot));
            }
            Ok(())
        }
        Err(err) if err.is_warning() => {
            tracing::warn!(url = source.url(), error = %err, "run ended without output");
            eprintln!("warning: {err}");
            Ok(())
        }
        Err(err) => {
            let err = anyhow::Error::new(err).context("error fetching live data");
            sentry_anyhow::capture_anyhow(&err);
            Err(err)
        }
    }
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
