use crate::domain::price::{PricePoint, PriceSeries};
use crate::domain::ticker::Ticker;
use crate::ingest::provider::PriceHistory;
use anyhow::{ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryResponse {
    pub ticker: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub is_demo_data: bool,
    pub points: Vec<PricePointRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePointRecord {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl PriceHistoryResponse {
    pub fn validate_and_into_history(self, expected: &Ticker) -> anyhow::Result<PriceHistory> {
        let ticker = self.ticker.trim().to_ascii_uppercase();
        ensure!(
            ticker == expected.as_str(),
            "provider ticker mismatch: expected {expected}, got {}",
            self.ticker
        );

        // Providers are not required to sort; the series is.
        let mut records = self.points;
        records.sort_by_key(|r| r.date);

        let points = records
            .into_iter()
            .map(|r| PricePoint {
                date: r.date,
                close: r.close,
                volume: r.volume,
            })
            .collect();
        let series = PriceSeries::try_new(points)
            .with_context(|| format!("invalid price series for {expected}"))?;

        let company_name = self
            .company_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(PriceHistory {
            series,
            company_name,
            is_demo_data: self.is_demo_data,
        })
    }
}
