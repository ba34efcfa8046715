#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub change: f64,
    pub percent: f64,
}

/// Day-over-day change of the last close.
///
/// A single close compares against itself. A previous close of zero, or one so
/// small that the ratio overflows, yields a percent change of zero.
pub fn price_change(closes: &[f64]) -> PriceChange {
    let Some(&current) = closes.last() else {
        return PriceChange {
            change: 0.0,
            percent: 0.0,
        };
    };
    let previous = if closes.len() >= 2 {
        closes[closes.len() - 2]
    } else {
        current
    };

    let change = current - previous;
    let percent = change / previous * 100.0;
    let percent = if previous == 0.0 || !percent.is_finite() {
        0.0
    } else {
        percent
    };

    PriceChange { change, percent }
}
