use super::{running_mean, trailing};

/// Simple moving average of the last `window` closes.
///
/// With fewer than `window` closes the average is taken over what exists
/// (`min(window, len)`); an empty input yields `0.0`.
pub fn sma(closes: &[f64], window: usize) -> f64 {
    running_mean(trailing(closes, window))
}
