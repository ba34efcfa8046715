use super::{running_mean, trailing};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger Bands over the last `window` closes: `middle ± k·σ`, with σ the
/// population standard deviation of the same window.
///
/// The window is clamped like [`super::sma`]. `k` is used by magnitude so that
/// `upper >= middle >= lower` holds for any input.
pub fn bollinger(closes: &[f64], window: usize, k: f64) -> BollingerBands {
    let w = trailing(closes, window);
    let middle = running_mean(w);

    let std_dev = population_std_dev(w, middle);
    let spread = if k.is_finite() { k.abs() * std_dev } else { 0.0 };

    // Near f64::MAX the bands saturate instead of going infinite.
    BollingerBands {
        upper: (middle + spread).min(f64::MAX),
        middle,
        lower: (middle - spread).max(f64::MIN),
    }
}

// Deviations are taken on values scaled by the largest magnitude so that
// squaring cannot overflow.
fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    let scale = values.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if values.is_empty() || scale == 0.0 {
        return 0.0;
    }

    let scaled_mean = mean / scale;
    let variance = values
        .iter()
        .map(|x| (x / scale - scaled_mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;

    let std_dev = variance.sqrt() * scale;
    if std_dev.is_finite() {
        std_dev
    } else {
        0.0
    }
}
