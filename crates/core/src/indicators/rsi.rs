// RSI over the last `period` deltas using a simple (arithmetic) average of
// gains and losses, not Wilder smoothing. The value depends only on the
// trailing `period + 1` closes.

const NEUTRAL_RSI: f64 = 50.0;

/// Relative Strength Index of the latest close, in `[0, 100]`.
///
/// - Fewer than 2 closes: 50 (neutral).
/// - Fewer than `period + 1` closes: computed over the deltas that exist.
/// - No losses and some gains: 100. No movement at all: 50.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if closes.len() < 2 {
        return NEUTRAL_RSI;
    }

    let deltas = period.max(1).min(closes.len() - 1);
    let window = &closes[closes.len() - deltas - 1..];

    // Each delta is divided before summing so huge prices cannot overflow.
    let n = deltas as f64;
    let (avg_gain, avg_loss) = window.windows(2).fold((0.0_f64, 0.0_f64), |(g, l), w| {
        let d = w[1] / n - w[0] / n;
        if d > 0.0 {
            (g + d, l)
        } else {
            (g, l - d)
        }
    });

    rsi_from_averages(avg_gain, avg_loss)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let value = if avg_loss == 0.0 && avg_gain == 0.0 {
        NEUTRAL_RSI
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        NEUTRAL_RSI
    }
}
