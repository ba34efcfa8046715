pub mod analysis;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod ingest;
pub mod recommend;
pub mod signals;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    use crate::indicators::IndicatorParams;
    use crate::signals::SignalThresholds;

    const DEFAULT_LOOKBACK_DAYS: u32 = 365;
    const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub data_provider_base_url: Option<String>,
        pub data_provider_api_key: Option<String>,
        pub allow_demo_fallback: bool,
        pub analysis: AnalysisSettings,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let analysis = AnalysisSettings::from_env();
            analysis.validate()?;

            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                data_provider_base_url: std::env::var("DATA_PROVIDER_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                data_provider_api_key: std::env::var("DATA_PROVIDER_API_KEY").ok(),
                allow_demo_fallback: std::env::var("ALLOW_DEMO_FALLBACK")
                    .ok()
                    .and_then(|s| parse_bool(&s))
                    .unwrap_or(true),
                analysis,
            })
        }

        pub fn require_data_provider_base_url(&self) -> anyhow::Result<&str> {
            self.data_provider_base_url
                .as_deref()
                .context("DATA_PROVIDER_BASE_URL is required")
        }
    }

    /// Tunables for a single analysis run. Every field has a default so a bare
    /// environment still produces the standard 20/50/14/20×2 configuration.
    #[derive(Debug, Clone, PartialEq)]
    pub struct AnalysisSettings {
        pub indicators: IndicatorParams,
        pub thresholds: SignalThresholds,
        pub lookback_days: u32,
        pub provider_timeout: Duration,
    }

    impl Default for AnalysisSettings {
        fn default() -> Self {
            Self {
                indicators: IndicatorParams::default(),
                thresholds: SignalThresholds::default(),
                lookback_days: DEFAULT_LOOKBACK_DAYS,
                provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            }
        }
    }

    impl AnalysisSettings {
        pub fn from_env() -> Self {
            let mut out = Self::default();

            if let Some(n) = env_parse::<usize>("ANALYSIS_SHORT_WINDOW") {
                out.indicators.short_window = n;
            }
            if let Some(n) = env_parse::<usize>("ANALYSIS_LONG_WINDOW") {
                out.indicators.long_window = n;
            }
            if let Some(n) = env_parse::<usize>("ANALYSIS_RSI_PERIOD") {
                out.indicators.rsi_period = n;
            }
            if let Some(n) = env_parse::<usize>("ANALYSIS_BOLLINGER_WINDOW") {
                out.indicators.bollinger_window = n;
            }
            if let Some(k) = env_parse::<f64>("ANALYSIS_BOLLINGER_K").filter(|k| k.is_finite()) {
                out.indicators.bollinger_k = k;
            }
            if let Some(n) = env_parse::<u32>("ANALYSIS_LOOKBACK_DAYS") {
                out.lookback_days = n;
            }
            if let Some(secs) = env_parse::<u64>("ANALYSIS_PROVIDER_TIMEOUT_SECS") {
                out.provider_timeout = Duration::from_secs(secs);
            }

            out
        }

        pub fn validate(&self) -> anyhow::Result<()> {
            let p = &self.indicators;
            anyhow::ensure!(
                p.short_window >= 1 && p.long_window >= 1,
                "moving average windows must be >= 1 (got short={}, long={})",
                p.short_window,
                p.long_window
            );
            anyhow::ensure!(
                p.short_window <= p.long_window,
                "short window must not exceed long window (got short={}, long={})",
                p.short_window,
                p.long_window
            );
            anyhow::ensure!(p.rsi_period >= 1, "RSI period must be >= 1");
            anyhow::ensure!(p.bollinger_window >= 1, "Bollinger window must be >= 1");
            anyhow::ensure!(
                (1..=3660).contains(&self.lookback_days),
                "lookback days must be 1..=3660 (got {})",
                self.lookback_days
            );
            anyhow::ensure!(
                !self.provider_timeout.is_zero(),
                "provider timeout must be non-zero"
            );
            Ok(())
        }
    }

    fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }

    fn parse_bool(s: &str) -> Option<bool> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

}
