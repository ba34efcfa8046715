use crate::domain::price::{PricePoint, PriceSeries};
use crate::domain::ticker::Ticker;
use crate::ingest::provider::{PriceHistory, PriceHistoryProvider};
use crate::time::market;
use anyhow::Result;
use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// Ten years of sessions is plenty for any lookback the settings allow.
const MAX_POINTS: usize = 2_520;

/// Deterministic placeholder history used when no live provider is configured
/// or reachable. The same ticker and as-of date always produce the same series.
#[derive(Debug, Clone)]
pub struct SyntheticPriceProvider {
    as_of_date: NaiveDate,
}

impl SyntheticPriceProvider {
    pub fn new(as_of_date: NaiveDate) -> Self {
        Self { as_of_date }
    }

    pub fn today() -> Self {
        let now = chrono::Utc::now();
        let as_of_date =
            market::resolve_as_of_date(None, now).unwrap_or_else(|_| now.date_naive());
        Self::new(as_of_date)
    }

    pub fn generate(&self, ticker: &Ticker, lookback_days: u32) -> Result<PriceSeries> {
        let count = market::approx_trading_days(lookback_days).clamp(1, MAX_POINTS);
        let dates = market::trading_days_ending(self.as_of_date, count);

        let mut rng = ChaCha8Rng::seed_from_u64(seed_for(ticker));
        let mut close: f64 = rng.gen_range(20.0..500.0);
        // Per-ticker drift between -0.1% and +0.1% a day.
        let drift: f64 = rng.gen_range(-0.001..0.001);
        let base_volume: u64 = rng.gen_range(100_000..5_000_000);

        let mut points = Vec::with_capacity(dates.len());
        for date in dates {
            let shock: f64 = rng.gen_range(-0.02..0.02);
            close = (close * (1.0 + drift + shock)).max(0.01);
            let volume_jitter: f64 = rng.gen_range(0.5..1.5);
            points.push(PricePoint {
                date,
                close: (close * 100.0).round() / 100.0,
                volume: (base_volume as f64 * volume_jitter) as u64,
            });
        }

        PriceSeries::try_new(points)
    }
}

#[async_trait::async_trait]
impl PriceHistoryProvider for SyntheticPriceProvider {
    fn provider_name(&self) -> &'static str {
        "synthetic_demo"
    }

    async fn get_history(&self, ticker: &Ticker, lookback_days: u32) -> Result<PriceHistory> {
        Ok(PriceHistory {
            series: self.generate(ticker, lookback_days)?,
            company_name: None,
            is_demo_data: true,
        })
    }
}

/// FNV-1a over the symbol bytes.
fn seed_for(ticker: &Ticker) -> u64 {
    ticker
        .as_str()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}
