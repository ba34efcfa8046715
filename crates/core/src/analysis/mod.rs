use std::sync::Arc;

use crate::config::AnalysisSettings;
use crate::domain::analysis::{AnalysisOutcome, TechnicalSnapshot};
use crate::domain::ticker::Ticker;
use crate::error::AnalysisError;
use crate::indicators::IndicatorSet;
use crate::ingest::{PriceHistory, PriceHistoryProvider};
use crate::recommend;
use crate::signals::Signals;

/// Run the engine over history that is already in hand.
///
/// Pure: the same inputs always produce an identical outcome.
pub fn analyze_history(
    ticker: &Ticker,
    company_hint: Option<&str>,
    history: &PriceHistory,
    settings: &AnalysisSettings,
) -> AnalysisOutcome {
    if history.series.is_empty() {
        let err = AnalysisError::data_unavailable(ticker.as_str(), "provider returned no prices");
        return AnalysisOutcome::unavailable(err.user_reason());
    }

    if history.series.len() < 2 {
        let err = AnalysisError::InsufficientHistory {
            ticker: ticker.to_string(),
            points: history.series.len(),
        };
        tracing::warn!(%ticker, error = %err, "analyzing with degraded indicators");
    }

    let closes = history.series.closes();
    let set = IndicatorSet::compute(&closes, &settings.indicators);
    let signals = Signals::classify(&set, &settings.thresholds);
    let recommendation = recommend::synthesize(&set, &signals, &settings.thresholds);

    let company_name = company_hint
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| history.company_name.clone())
        .unwrap_or_else(|| ticker.to_string());

    let snapshot = TechnicalSnapshot {
        ticker: ticker.to_string(),
        company_name,
        current_price: set.current_price,
        price_change: set.change.change,
        price_change_percent: set.change.percent,
        short_ma: set.short_ma,
        long_ma: set.long_ma,
        rsi: set.rsi,
        bollinger_upper: set.bands.upper,
        bollinger_lower: set.bands.lower,
        is_demo_data: history.is_demo_data,
    };

    tracing::debug!(
        %ticker,
        action = %recommendation.action,
        trend = ?signals.trend,
        momentum = ?signals.momentum,
        volatility = ?signals.volatility,
        "analysis complete"
    );

    AnalysisOutcome::Success {
        snapshot,
        recommendation,
    }
}

pub struct Analyzer {
    provider: Arc<dyn PriceHistoryProvider>,
    settings: AnalysisSettings,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn PriceHistoryProvider>, settings: AnalysisSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Fetch and analyze. Provider errors, timeouts and empty histories all
    /// come back as `AnalysisOutcome::Unavailable`; this never fails.
    pub async fn analyze(&self, ticker: &Ticker, company_hint: Option<&str>) -> AnalysisOutcome {
        match self.fetch(ticker).await {
            Ok(history) => analyze_history(ticker, company_hint, &history, &self.settings),
            Err(err) => {
                tracing::warn!(
                    %ticker,
                    provider = self.provider.provider_name(),
                    error = %err,
                    "price history unavailable"
                );
                AnalysisOutcome::unavailable(err.user_reason())
            }
        }
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<PriceHistory, AnalysisError> {
        let timeout = self.settings.provider_timeout;
        let fut = self.provider.get_history(ticker, self.settings.lookback_days);

        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(history)) if history.series.is_empty() => Err(AnalysisError::data_unavailable(
                ticker.as_str(),
                "provider returned no prices",
            )),
            Ok(Ok(history)) => Ok(history),
            Ok(Err(err)) => Err(AnalysisError::data_unavailable(
                ticker.as_str(),
                format!("{err:#}"),
            )),
            Err(_) => Err(AnalysisError::data_unavailable(
                ticker.as_str(),
                format!("timed out after {timeout:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::Action;
    use crate::domain::price::PriceSeries;
    use chrono::NaiveDate;
    use std::time::Duration;

    struct StaticProvider {
        history: PriceHistory,
    }

    #[async_trait::async_trait]
    impl PriceHistoryProvider for StaticProvider {
        fn provider_name(&self) -> &'static str {
            "static"
        }

        async fn get_history(&self, _ticker: &Ticker, _days: u32) -> anyhow::Result<PriceHistory> {
            Ok(self.history.clone())
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl PriceHistoryProvider for FailingProvider {
        fn provider_name(&self) -> &'static str {
            "failing"
        }

        async fn get_history(&self, _ticker: &Ticker, _days: u32) -> anyhow::Result<PriceHistory> {
            anyhow::bail!("upstream HTTP 502")
        }
    }

    struct SlowProvider;

    #[async_trait::async_trait]
    impl PriceHistoryProvider for SlowProvider {
        fn provider_name(&self) -> &'static str {
            "slow"
        }

        async fn get_history(&self, _ticker: &Ticker, _days: u32) -> anyhow::Result<PriceHistory> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            anyhow::bail!("unreachable")
        }
    }

    fn history(closes: &[f64], is_demo_data: bool) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        PriceHistory {
            series: PriceSeries::from_closes(start, closes).unwrap(),
            company_name: Some("Acme Corp".to_string()),
            is_demo_data,
        }
    }

    fn ticker() -> Ticker {
        Ticker::parse("ACME").unwrap()
    }

    fn linear(from: f64, to: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| from + (to - from) * i as f64 / (n - 1) as f64)
            .collect()
    }

    fn run(closes: &[f64]) -> AnalysisOutcome {
        analyze_history(
            &ticker(),
            None,
            &history(closes, false),
            &AnalysisSettings::default(),
        )
    }

    #[test]
    fn constant_series_is_neutral_hold() {
        let outcome = run(&[42.5; 80]);
        let snap = outcome.snapshot().unwrap();
        assert_eq!(snap.rsi, 50.0);
        assert_eq!(snap.bollinger_upper, 42.5);
        assert_eq!(snap.bollinger_lower, 42.5);
        assert_eq!(snap.short_ma, snap.long_ma);
        assert_eq!(outcome.recommendation().unwrap().action, Action::Hold);
    }

    #[test]
    fn single_point_is_hold_without_failure() {
        let outcome = run(&[100.0]);
        let snap = outcome.snapshot().unwrap();
        assert_eq!(snap.short_ma, 100.0);
        assert_eq!(snap.long_ma, 100.0);
        assert_eq!(snap.rsi, 50.0);
        assert_eq!(snap.bollinger_upper, 100.0);
        assert_eq!(snap.bollinger_lower, 100.0);
        assert_eq!(snap.price_change, 0.0);
        assert_eq!(outcome.recommendation().unwrap().action, Action::Hold);
    }

    #[test]
    fn zero_previous_close_has_zero_percent_change() {
        let outcome = run(&[5.0, 0.0, 3.0]);
        let snap = outcome.snapshot().unwrap();
        assert_eq!(snap.price_change, 3.0);
        assert_eq!(snap.price_change_percent, 0.0);
    }

    #[test]
    fn rising_series_is_bullish_and_never_sells() {
        let outcome = run(&linear(100.0, 130.0, 30));
        let snap = outcome.snapshot().unwrap();
        assert!(snap.short_ma > snap.long_ma);
        assert!(snap.rsi > 50.0);
        assert_ne!(outcome.recommendation().unwrap().action, Action::Sell);
    }

    #[test]
    fn falling_series_is_bearish_and_never_buys() {
        let outcome = run(&linear(130.0, 100.0, 30));
        let snap = outcome.snapshot().unwrap();
        assert!(snap.short_ma < snap.long_ma);
        assert!(snap.rsi < 50.0);
        assert_ne!(outcome.recommendation().unwrap().action, Action::Buy);
    }

    #[test]
    fn long_strictly_rising_series_is_bullish() {
        let outcome = run(&linear(10.0, 11.0, 100));
        let snap = outcome.snapshot().unwrap();
        assert!(snap.short_ma > snap.long_ma);
    }

    #[test]
    fn indicator_invariants_hold_on_noisy_data() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 8.0 + (i as f64 * 0.13).cos() * 3.0)
            .collect();
        for end in 1..=closes.len() {
            let outcome = run(&closes[..end]);
            let snap = outcome.snapshot().unwrap();
            assert!((0.0..=100.0).contains(&snap.rsi));
            assert!(snap.bollinger_upper >= snap.bollinger_lower);
        }
    }

    #[test]
    fn demo_flag_propagates_without_changing_math() {
        let closes = linear(50.0, 65.0, 40);
        let live = analyze_history(&ticker(), None, &history(&closes, false), &AnalysisSettings::default());
        let demo = analyze_history(&ticker(), None, &history(&closes, true), &AnalysisSettings::default());

        let (live_snap, demo_snap) = (live.snapshot().unwrap(), demo.snapshot().unwrap());
        assert!(!live_snap.is_demo_data);
        assert!(demo_snap.is_demo_data);
        assert_eq!(
            TechnicalSnapshot {
                is_demo_data: false,
                ..demo_snap.clone()
            },
            *live_snap
        );
        assert_eq!(live.recommendation(), demo.recommendation());
    }

    #[test]
    fn repeated_analysis_is_byte_identical() {
        let closes = linear(80.0, 95.0, 60);
        let a = serde_json::to_vec(&run(&closes)).unwrap();
        let b = serde_json::to_vec(&run(&closes)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn company_name_prefers_hint_then_provider_then_ticker() {
        let settings = AnalysisSettings::default();
        let mut h = history(&[1.0, 2.0], false);

        let outcome = analyze_history(&ticker(), Some("Acme Holdings"), &h, &settings);
        assert_eq!(outcome.snapshot().unwrap().company_name, "Acme Holdings");

        let outcome = analyze_history(&ticker(), Some("  "), &h, &settings);
        assert_eq!(outcome.snapshot().unwrap().company_name, "Acme Corp");

        h.company_name = None;
        let outcome = analyze_history(&ticker(), None, &h, &settings);
        assert_eq!(outcome.snapshot().unwrap().company_name, "ACME");
    }

    #[test]
    fn extreme_closes_produce_a_finite_snapshot_that_round_trips() {
        for closes in [[1e308, 0.0, 1e308, 0.0], [f64::MAX, 0.0, f64::MAX, 0.0]] {
            let outcome = run(&closes);
            let snap = outcome.snapshot().unwrap();
            for v in [
                snap.current_price,
                snap.price_change,
                snap.price_change_percent,
                snap.short_ma,
                snap.long_ma,
                snap.rsi,
                snap.bollinger_upper,
                snap.bollinger_lower,
            ] {
                assert!(v.is_finite(), "{snap:?}");
            }
            assert!(snap.bollinger_upper >= snap.short_ma);
            assert!(snap.short_ma >= snap.bollinger_lower);

        }

        let outcome = run(&[1e308, 0.0, 1e308, 0.0]);
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("null"), "{json}");
        let back: AnalysisOutcome = serde_json::from_str(&json).unwrap();
        let (a, b) = (outcome.snapshot().unwrap(), back.snapshot().unwrap());
        assert!((a.bollinger_upper - b.bollinger_upper).abs() / a.bollinger_upper < 1e-12);
        assert_eq!(back.recommendation().unwrap().action, outcome.recommendation().unwrap().action);
    }

    #[test]
    fn empty_history_is_unavailable() {
        let outcome = run(&[]);
        assert!(matches!(outcome, AnalysisOutcome::Unavailable { .. }));
    }

    #[tokio::test]
    async fn analyzer_uses_provider_history() {
        let analyzer = Analyzer::new(
            Arc::new(StaticProvider {
                history: history(&linear(100.0, 130.0, 30), true),
            }),
            AnalysisSettings::default(),
        );
        let outcome = analyzer.analyze(&ticker(), None).await;
        let snap = outcome.snapshot().unwrap();
        assert!(snap.is_demo_data);
        assert_eq!(snap.company_name, "Acme Corp");
        assert_eq!(analyzer.provider_name(), "static");
    }

    #[tokio::test]
    async fn provider_error_is_unavailable() {
        let analyzer = Analyzer::new(Arc::new(FailingProvider), AnalysisSettings::default());
        let outcome = analyzer.analyze(&ticker(), None).await;
        assert_eq!(
            outcome,
            AnalysisOutcome::unavailable("analysis unavailable: no price data")
        );
    }

    #[tokio::test]
    async fn empty_provider_history_is_unavailable() {
        let analyzer = Analyzer::new(
            Arc::new(StaticProvider {
                history: history(&[], false),
            }),
            AnalysisSettings::default(),
        );
        assert!(!analyzer.analyze(&ticker(), None).await.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let settings = AnalysisSettings {
            provider_timeout: Duration::from_millis(50),
            ..AnalysisSettings::default()
        };
        let analyzer = Analyzer::new(Arc::new(SlowProvider), settings);
        let outcome = analyzer.analyze(&ticker(), None).await;
        assert!(matches!(outcome, AnalysisOutcome::Unavailable { .. }));
    }
}
