use std::fmt;

/// Failures surfaced by the analysis engine and its boundaries.
///
/// Only `DataUnavailable` ever reaches a caller of the assembler, and even then
/// it is folded into an `Unavailable` outcome rather than returned as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    DataUnavailable { ticker: String, detail: String },
    InsufficientHistory { ticker: String, points: usize },
    InvalidTicker { raw: String, detail: &'static str },
}

impl AnalysisError {
    pub fn data_unavailable(ticker: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::DataUnavailable {
            ticker: ticker.into(),
            detail: detail.to_string(),
        }
    }

    /// Short reason suitable for showing to an end user.
    pub fn user_reason(&self) -> String {
        match self {
            Self::DataUnavailable { .. } => "analysis unavailable: no price data".to_string(),
            Self::InsufficientHistory { .. } => "analysis limited: short price history".to_string(),
            Self::InvalidTicker { .. } => "invalid ticker symbol".to_string(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataUnavailable { ticker, detail } => {
                write!(f, "price data unavailable (ticker={ticker}): {detail}")
            }
            Self::InsufficientHistory { ticker, points } => write!(
                f,
                "insufficient price history (ticker={ticker}, points={points})"
            ),
            Self::InvalidTicker { raw, detail } => {
                write!(f, "invalid ticker {raw:?}: {detail}")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
