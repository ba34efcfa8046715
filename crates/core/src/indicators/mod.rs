//! Pure indicator math over daily closes.
//!
//! Every function here returns a number for any input, including an empty or
//! single-point series: windows are clamped to the data that exists, so the
//! caller always has something to show.

pub mod bollinger;
pub mod change;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger, BollingerBands};
pub use change::{price_change, PriceChange};
pub use rsi::rsi;
pub use sma::sma;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 50,
            rsi_period: 14,
            bollinger_window: 20,
            bollinger_k: 2.0,
        }
    }
}

/// All indicator readings at the latest close.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub current_price: f64,
    pub change: PriceChange,
    pub short_ma: f64,
    pub long_ma: f64,
    pub rsi: f64,
    pub bands: BollingerBands,
}

impl IndicatorSet {
    pub fn compute(closes: &[f64], params: &IndicatorParams) -> Self {
        Self {
            current_price: closes.last().copied().unwrap_or(0.0),
            change: price_change(closes),
            short_ma: sma(closes, params.short_window),
            long_ma: sma(closes, params.long_window),
            rsi: rsi(closes, params.rsi_period),
            bands: bollinger(closes, params.bollinger_window, params.bollinger_k),
        }
    }
}

/// Arithmetic mean as a running average. Each step moves by `x/i - m/i`, which
/// stays finite for any finite input and is exactly zero for repeated prices.
pub(crate) fn running_mean(values: &[f64]) -> f64 {
    values.iter().enumerate().fold(0.0, |m, (i, &x)| {
        let n = (i + 1) as f64;
        m + (x / n - m / n)
    })
}

/// Trailing slice of at most `window` values (a zero window is treated as one).
pub(crate) fn trailing(values: &[f64], window: usize) -> &[f64] {
    let n = window.max(1).min(values.len());
    &values[values.len() - n..]
}
