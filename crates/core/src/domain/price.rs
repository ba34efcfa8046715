use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
}

/// Daily closes for one ticker, strictly ascending by date.
///
/// An empty series is representable; the assembler reports it as unavailable
/// instead of computing anything from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn try_new(points: Vec<PricePoint>) -> anyhow::Result<Self> {
        for p in &points {
            ensure!(
                p.close.is_finite() && p.close >= 0.0,
                "close must be finite and non-negative (date={}, close={})",
                p.date,
                p.close
            );
        }

        for pair in points.windows(2) {
            ensure!(
                pair[0].date < pair[1].date,
                "price points must have strictly increasing dates ({} then {})",
                pair[0].date,
                pair[1].date
            );
        }

        Ok(Self { points })
    }

    pub fn from_closes(start: NaiveDate, closes: &[f64]) -> anyhow::Result<Self> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close,
                volume: 0,
            })
            .collect();
        Self::try_new(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    pub fn previous_close(&self) -> Option<f64> {
        let n = self.points.len();
        (n >= 2).then(|| self.points[n - 2].close)
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}
