use crate::domain::analysis::PricePointReason;
use crate::indicators::IndicatorSet;

const SUPPORT_DISCOUNT: f64 = 0.97;
const RESISTANCE_PREMIUM: f64 = 1.03;

pub fn buy_points(set: &IndicatorSet) -> Vec<PricePointReason> {
    vec![PricePointReason {
        price: set.bands.lower.min(set.short_ma * SUPPORT_DISCOUNT),
        reason: "near support / below short-term average".to_string(),
    }]
}

pub fn sell_points(set: &IndicatorSet) -> Vec<PricePointReason> {
    vec![PricePointReason {
        price: set
            .bands
            .upper
            .max(set.short_ma * RESISTANCE_PREMIUM)
            .min(f64::MAX),
        reason: "near resistance / above short-term average".to_string(),
    }]
}
