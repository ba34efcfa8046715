use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TICKER_LEN: usize = 10;

/// A syntactically valid, upper-cased ticker symbol (e.g. `AAPL`, `BRK.B`, `KRX:005930`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, AnalysisError> {
        let s = raw.trim().to_ascii_uppercase();
        let invalid = |detail| AnalysisError::InvalidTicker {
            raw: raw.to_string(),
            detail,
        };

        if s.is_empty() {
            return Err(invalid("ticker must be non-empty"));
        }
        if s.len() > MAX_TICKER_LEN {
            return Err(invalid("ticker is too long"));
        }
        if !s.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(invalid("ticker must start with a letter or digit"));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'))
        {
            return Err(invalid("ticker contains an unsupported character"));
        }

        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Ticker {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
