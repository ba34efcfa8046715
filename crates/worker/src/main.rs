use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::analysis::Analyzer;
use finsight_core::domain::analysis::AnalysisOutcome;
use finsight_core::domain::ticker::Ticker;
use finsight_core::ingest::{PriceHistoryProvider, SyntheticPriceProvider};

#[derive(Debug, Parser)]
#[command(name = "finsight_worker")]
struct Args {
    /// Comma-separated ticker symbols to analyze.
    #[arg(long, value_delimiter = ',', required = true)]
    tickers: Vec<String>,

    /// Company name to show in the snapshot (only meaningful with a single ticker).
    #[arg(long)]
    company: Option<String>,

    /// Calendar days of history to request. Defaults to ANALYSIS_LOOKBACK_DAYS.
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Skip the live provider and analyze demo data.
    #[arg(long)]
    demo: bool,

    /// Last session of demo data (YYYY-MM-DD). Defaults to the latest completed session.
    #[arg(long)]
    as_of_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct WorkerLine<'a> {
    ticker: &'a str,
    #[serde(flatten)]
    outcome: AnalysisOutcome,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsight_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let mut analysis = settings.analysis.clone();
    if let Some(days) = args.lookback_days {
        analysis.lookback_days = days;
    }
    analysis.validate()?;

    let provider: Arc<dyn PriceHistoryProvider> = if args.demo {
        let as_of_date = finsight_core::time::market::resolve_as_of_date(
            args.as_of_date.as_deref(),
            chrono::Utc::now(),
        )?;
        tracing::info!(%as_of_date, "using demo price data");
        Arc::new(SyntheticPriceProvider::new(as_of_date))
    } else {
        reported(
            finsight_core::ingest::provider::from_settings(&settings)
                .context("failed to build price provider"),
        )?
    };

    let analyzer = Arc::new(Analyzer::new(provider, analysis));
    let company = args.company.map(Arc::<str>::from);

    let mut handles = Vec::with_capacity(args.tickers.len());
    for raw in &args.tickers {
        let ticker = match Ticker::parse(raw) {
            Ok(t) => t,
            Err(err) => {
                tracing::error!(error = %err, "skipping ticker");
                continue;
            }
        };

        let analyzer = Arc::clone(&analyzer);
        let company = company.clone();
        handles.push(tokio::spawn(async move {
            let outcome = analyzer.analyze(&ticker, company.as_deref()).await;
            (ticker, outcome)
        }));
    }

    let mut unavailable: usize = 0;
    for handle in handles {
        let (ticker, outcome) = match handle.await.context("analysis task panicked") {
            Ok(done) => done,
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "analysis task lost");
                unavailable += 1;
                continue;
            }
        };
        if !outcome.is_success() {
            unavailable += 1;
        }
        let line = reported(
            serde_json::to_string(&WorkerLine {
                ticker: ticker.as_str(),
                outcome,
            })
            .context("failed to serialize analysis line"),
        )?;
        println!("{line}");
    }

    tracing::info!(
        requested = args.tickers.len(),
        unavailable,
        provider = analyzer.provider_name(),
        "worker run finished"
    );
    Ok(())
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
