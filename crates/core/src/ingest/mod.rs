pub mod provider;
pub mod synthetic;
pub mod types;

pub use provider::{FallbackPriceProvider, HttpJsonPriceProvider, PriceHistory, PriceHistoryProvider};
pub use synthetic::SyntheticPriceProvider;
