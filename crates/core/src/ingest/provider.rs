use crate::config::Settings;
use crate::domain::price::PriceSeries;
use crate::domain::ticker::Ticker;
use crate::ingest::types::PriceHistoryResponse;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PATH: &str = "/v1/price_history";
const DEFAULT_RETRIES: u32 = 2;
const BASE_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF_SHIFT: u32 = 4;
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Daily history for one ticker as handed over by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub series: PriceSeries,
    pub company_name: Option<String>,
    pub is_demo_data: bool,
}

#[async_trait::async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn get_history(&self, ticker: &Ticker, lookback_days: u32) -> Result<PriceHistory>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonPriceProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonPriceProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_data_provider_base_url()?.to_string();
        let api_key = settings.data_provider_api_key.clone();

        let retries = std::env::var("DATA_PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        // Without an explicit per-request timeout, every attempt plus the
        // backoff between them has to fit inside the analyzer's deadline.
        let timeout = std::env::var("DATA_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| attempt_timeout(settings.analysis.provider_timeout, retries));

        let path = std::env::var("DATA_PROVIDER_HISTORY_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build price provider http client")?;

        tracing::debug!(retries, ?timeout, "configured price provider");

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, ticker: &Ticker, lookback_days: u32) -> Result<PriceHistoryResponse> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[
                ("ticker", ticker.to_string()),
                ("lookback_days", lookback_days.to_string()),
            ])
            .send()
            .await
            .context("price provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read price provider response")?;

        if !status.is_success() {
            anyhow::bail!("price provider HTTP {status}: {text}");
        }

        serde_json::from_str::<PriceHistoryResponse>(&text)
            .context("failed to parse price provider response into PriceHistoryResponse")
    }
}

#[async_trait::async_trait]
impl PriceHistoryProvider for HttpJsonPriceProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn get_history(&self, ticker: &Ticker, lookback_days: u32) -> Result<PriceHistory> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(ticker, lookback_days).await {
                Ok(parsed) => return parsed.validate_and_into_history(ticker),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let delay = backoff(attempt);
                    tracing::warn!(attempt, %ticker, backoff = ?delay, error = %err, "price history fetch failed; retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Delay before retrying after failed attempt number `attempt` (1-based).
/// Doubles from 250ms and stops growing at 4s.
fn backoff(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    Duration::from_millis(BASE_BACKOFF_MS << shift)
}

/// Per-request timeout that lets `retries` attempts and their backoffs share
/// one overall `budget`, never below one second.
fn attempt_timeout(budget: Duration, retries: u32) -> Duration {
    let retries = retries.max(1);
    let waiting: Duration = (1..retries).map(backoff).sum();
    (budget.saturating_sub(waiting) / retries).max(MIN_ATTEMPT_TIMEOUT)
}

/// Serves live data when it can and demo data when it cannot.
///
/// The fallback's history is always flagged as demo so callers can label it.
pub struct FallbackPriceProvider {
    primary: Arc<dyn PriceHistoryProvider>,
    fallback: Arc<dyn PriceHistoryProvider>,
}

impl FallbackPriceProvider {
    pub fn new(
        primary: Arc<dyn PriceHistoryProvider>,
        fallback: Arc<dyn PriceHistoryProvider>,
    ) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait::async_trait]
impl PriceHistoryProvider for FallbackPriceProvider {
    fn provider_name(&self) -> &'static str {
        "fallback"
    }

    async fn get_history(&self, ticker: &Ticker, lookback_days: u32) -> Result<PriceHistory> {
        let reason = match self.primary.get_history(ticker, lookback_days).await {
            Ok(history) if !history.series.is_empty() => return Ok(history),
            Ok(_) => "empty series".to_string(),
            Err(err) => format!("{err:#}"),
        };

        tracing::warn!(
            %ticker,
            primary = self.primary.provider_name(),
            fallback = self.fallback.provider_name(),
            error = %reason,
            "primary price provider unusable; serving demo data"
        );

        let mut history = self
            .fallback
            .get_history(ticker, lookback_days)
            .await
            .with_context(|| format!("fallback provider failed after primary error: {reason}"))?;
        history.is_demo_data = true;
        Ok(history)
    }
}

/// Build the provider chain described by `settings`.
///
/// No base URL means demo data only; with a base URL the live provider is
/// used, wrapped in a demo fallback unless `ALLOW_DEMO_FALLBACK` is off.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn PriceHistoryProvider>> {
    let synthetic: Arc<dyn PriceHistoryProvider> =
        Arc::new(crate::ingest::SyntheticPriceProvider::today());

    if settings.data_provider_base_url.is_none() {
        tracing::info!("DATA_PROVIDER_BASE_URL not set; using demo price data");
        return Ok(synthetic);
    }

    let live: Arc<dyn PriceHistoryProvider> = Arc::new(HttpJsonPriceProvider::from_settings(settings)?);
    if settings.allow_demo_fallback {
        Ok(Arc::new(FallbackPriceProvider::new(live, synthetic)))
    } else {
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Fixed(Result<PriceHistory, &'static str>);

    #[async_trait::async_trait]
    impl PriceHistoryProvider for Fixed {
        fn provider_name(&self) -> &'static str {
            "fixed"
        }

        async fn get_history(&self, _ticker: &Ticker, _lookback_days: u32) -> Result<PriceHistory> {
            self.0.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn history(closes: &[f64], is_demo_data: bool) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        PriceHistory {
            series: PriceSeries::from_closes(start, closes).unwrap(),
            company_name: None,
            is_demo_data,
        }
    }

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    #[tokio::test]
    async fn fallback_passes_live_data_through() {
        let provider = FallbackPriceProvider::new(
            Arc::new(Fixed(Ok(history(&[1.0, 2.0], false)))),
            Arc::new(Fixed(Ok(history(&[9.0], false)))),
        );
        let out = provider.get_history(&ticker(), 30).await.unwrap();
        assert_eq!(out.series.closes(), vec![1.0, 2.0]);
        assert!(!out.is_demo_data);
    }

    #[tokio::test]
    async fn fallback_marks_demo_on_primary_error() {
        let provider = FallbackPriceProvider::new(
            Arc::new(Fixed(Err("connection refused"))),
            Arc::new(Fixed(Ok(history(&[9.0], false)))),
        );
        let out = provider.get_history(&ticker(), 30).await.unwrap();
        assert_eq!(out.series.closes(), vec![9.0]);
        assert!(out.is_demo_data);
    }

    #[tokio::test]
    async fn fallback_used_for_empty_live_series() {
        let provider = FallbackPriceProvider::new(
            Arc::new(Fixed(Ok(history(&[], false)))),
            Arc::new(Fixed(Ok(history(&[5.0, 6.0], true)))),
        );
        let out = provider.get_history(&ticker(), 30).await.unwrap();
        assert_eq!(out.series.len(), 2);
        assert!(out.is_demo_data);
    }

    #[tokio::test]
    async fn fallback_error_reports_both_failures() {
        let provider = FallbackPriceProvider::new(
            Arc::new(Fixed(Err("primary down"))),
            Arc::new(Fixed(Err("fallback down"))),
        );
        let err = provider.get_history(&ticker(), 30).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("primary down"), "{msg}");
        assert!(msg.contains("fallback down"), "{msg}");
    }

    #[test]
    fn url_joins_base_and_path() {
        let provider = HttpJsonPriceProvider {
            http: reqwest::Client::new(),
            base_url: "https://prices.example.com/".to_string(),
            api_key: None,
            path: "v1/price_history".to_string(),
            retries: 1,
        };
        assert_eq!(provider.url(), "https://prices.example.com/v1/price_history");
        assert!(provider.headers().unwrap().is_empty());
    }

    #[test]
    fn backoff_doubles_then_levels_off() {
        assert_eq!(backoff(1), Duration::from_millis(250));
        assert_eq!(backoff(2), Duration::from_millis(500));
        assert_eq!(backoff(5), Duration::from_secs(4));
        assert_eq!(backoff(64), Duration::from_secs(4));
        assert_eq!(backoff(u32::MAX), Duration::from_secs(4));
    }

    #[test]
    fn attempts_share_the_analysis_budget() {
        let budget = Duration::from_secs(10);

        let t = attempt_timeout(budget, 2);
        assert_eq!(t, Duration::from_millis(4875));
        assert!(t * 2 + backoff(1) <= budget);

        assert_eq!(attempt_timeout(budget, 1), budget);
        assert_eq!(attempt_timeout(budget, 0), budget);
        assert_eq!(attempt_timeout(Duration::from_secs(2), 10), MIN_ATTEMPT_TIMEOUT);
    }

    #[tokio::test]
    async fn unreachable_provider_is_retried_then_fails() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let provider = HttpJsonPriceProvider {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap(),
            base_url: format!("http://127.0.0.1:{port}"),
            api_key: Some("test-key".to_string()),
            path: DEFAULT_PATH.to_string(),
            retries: 2,
        };

        let started = std::time::Instant::now();
        let err = provider.get_history(&ticker(), 30).await.unwrap_err();

        assert!(format!("{err:#}").contains("price provider request failed"), "{err:#}");
        assert!(started.elapsed() >= backoff(1));
    }
}
