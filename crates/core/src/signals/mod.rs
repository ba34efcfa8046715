//! Qualitative readings derived from raw indicator values.
//!
//! Trend, momentum and volatility position are classified independently and
//! never consult each other; the synthesizer is the only place they combine.

use serde::{Deserialize, Serialize};

use crate::indicators::{BollingerBands, IndicatorSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Momentum {
    Oversold,
    Overbought,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityPosition {
    NearUpperBand,
    NearLowerBand,
    InBand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalThresholds {
    pub oversold: f64,
    pub overbought: f64,
    /// Fractional distance from a band that still counts as touching it.
    pub band_tolerance: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
            band_tolerance: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub trend: Trend,
    pub momentum: Momentum,
    pub volatility: VolatilityPosition,
}

impl Signals {
    pub fn classify(set: &IndicatorSet, thresholds: &SignalThresholds) -> Self {
        Self {
            trend: classify_trend(set.short_ma, set.long_ma),
            momentum: classify_momentum(set.rsi, thresholds),
            volatility: classify_volatility(set.current_price, &set.bands, thresholds),
        }
    }
}

pub fn classify_trend(short_ma: f64, long_ma: f64) -> Trend {
    if short_ma > long_ma {
        Trend::Bullish
    } else if short_ma < long_ma {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

pub fn classify_momentum(rsi: f64, thresholds: &SignalThresholds) -> Momentum {
    if rsi < thresholds.oversold {
        Momentum::Oversold
    } else if rsi > thresholds.overbought {
        Momentum::Overbought
    } else {
        Momentum::Neutral
    }
}

/// Upper band is checked first, so a collapsed band (flat prices) reads as
/// `NearUpperBand`.
pub fn classify_volatility(
    price: f64,
    bands: &BollingerBands,
    thresholds: &SignalThresholds,
) -> VolatilityPosition {
    if price >= bands.upper * (1.0 - thresholds.band_tolerance) {
        VolatilityPosition::NearUpperBand
    } else if price <= bands.lower * (1.0 + thresholds.band_tolerance) {
        VolatilityPosition::NearLowerBand
    } else {
        VolatilityPosition::InBand
    }
}
