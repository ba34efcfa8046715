use serde::{Deserialize, Serialize};
use std::fmt;

/// Indicator readings for one ticker at the latest close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub ticker: String,
    pub company_name: String,
    pub current_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub short_ma: f64,
    pub long_ma: f64,
    pub rsi: f64,
    pub bollinger_upper: f64,
    pub bollinger_lower: f64,
    pub is_demo_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Hold,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Hold => write!(f, "hold"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Advisory price level with its rationale. Not an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePointReason {
    pub price: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    pub reasons: Vec<String>,
    pub buy_points: Vec<PricePointReason>,
    pub sell_points: Vec<PricePointReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success {
        snapshot: TechnicalSnapshot,
        recommendation: Recommendation,
    },
    Unavailable {
        reason: String,
    },
}

impl AnalysisOutcome {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn snapshot(&self) -> Option<&TechnicalSnapshot> {
        match self {
            Self::Success { snapshot, .. } => Some(snapshot),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Self::Success { recommendation, .. } => Some(recommendation),
            Self::Unavailable { .. } => None,
        }
    }
}
