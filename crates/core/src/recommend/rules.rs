//! Ordered decision table. The first rule whose predicate holds decides the
//! action, and only that rule contributes reasons.

use crate::domain::analysis::Action;
use crate::indicators::IndicatorSet;
use crate::signals::{Momentum, SignalThresholds, Signals, Trend, VolatilityPosition};

pub struct RuleContext<'a> {
    pub set: &'a IndicatorSet,
    pub signals: &'a Signals,
    pub thresholds: &'a SignalThresholds,
}

pub struct Rule {
    pub name: &'static str,
    pub action: Action,
    pub applies: fn(&Signals) -> bool,
    pub explain: fn(&RuleContext<'_>) -> Vec<String>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("action", &self.action)
            .finish()
    }
}

pub static RULES: [Rule; 7] = [
    Rule {
        name: "bullish_trend_oversold",
        action: Action::Buy,
        applies: bullish_and_oversold,
        explain: trend_and_momentum,
    },
    Rule {
        name: "bearish_trend_overbought",
        action: Action::Sell,
        applies: bearish_and_overbought,
        explain: trend_and_momentum,
    },
    Rule {
        name: "oversold_at_lower_band",
        action: Action::Buy,
        applies: oversold_at_lower_band,
        explain: lower_band_reason,
    },
    Rule {
        name: "overbought_at_upper_band",
        action: Action::Sell,
        applies: overbought_at_upper_band,
        explain: upper_band_reason,
    },
    Rule {
        name: "bullish_trend",
        action: Action::Buy,
        applies: bullish,
        explain: trend_only,
    },
    Rule {
        name: "bearish_trend",
        action: Action::Sell,
        applies: bearish,
        explain: trend_only,
    },
    Rule {
        name: "no_signal",
        action: Action::Hold,
        applies: always,
        explain: no_signal_reason,
    },
];

pub fn matching_rule(signals: &Signals) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(signals))
        .unwrap_or(&RULES[RULES.len() - 1])
}

fn bullish_and_oversold(s: &Signals) -> bool {
    s.trend == Trend::Bullish && s.momentum == Momentum::Oversold
}

fn bearish_and_overbought(s: &Signals) -> bool {
    s.trend == Trend::Bearish && s.momentum == Momentum::Overbought
}

// Band reversals are not taken against the prevailing trend.
fn oversold_at_lower_band(s: &Signals) -> bool {
    s.momentum == Momentum::Oversold
        && s.volatility == VolatilityPosition::NearLowerBand
        && s.trend != Trend::Bearish
}

fn overbought_at_upper_band(s: &Signals) -> bool {
    s.momentum == Momentum::Overbought
        && s.volatility == VolatilityPosition::NearUpperBand
        && s.trend != Trend::Bullish
}

fn bullish(s: &Signals) -> bool {
    s.trend == Trend::Bullish
}

fn bearish(s: &Signals) -> bool {
    s.trend == Trend::Bearish
}

fn always(_: &Signals) -> bool {
    true
}

fn lower_band_reason(_: &RuleContext<'_>) -> Vec<String> {
    vec!["price near lower volatility band while oversold".to_string()]
}

fn upper_band_reason(_: &RuleContext<'_>) -> Vec<String> {
    vec!["price near upper volatility band while overbought".to_string()]
}

fn no_signal_reason(_: &RuleContext<'_>) -> Vec<String> {
    vec!["no strong directional signal".to_string()]
}

fn trend_only(ctx: &RuleContext<'_>) -> Vec<String> {
    trend_reason(ctx).into_iter().collect()
}

fn trend_and_momentum(ctx: &RuleContext<'_>) -> Vec<String> {
    trend_reason(ctx)
        .into_iter()
        .chain(momentum_reason(ctx))
        .collect()
}

fn trend_reason(ctx: &RuleContext<'_>) -> Option<String> {
    let (short, long) = (ctx.set.short_ma, ctx.set.long_ma);
    match ctx.signals.trend {
        Trend::Bullish => Some(format!(
            "short-term average {short:.2} is above long-term average {long:.2} (bullish trend)"
        )),
        Trend::Bearish => Some(format!(
            "short-term average {short:.2} is below long-term average {long:.2} (bearish trend)"
        )),
        Trend::Neutral => None,
    }
}

fn momentum_reason(ctx: &RuleContext<'_>) -> Option<String> {
    let rsi = ctx.set.rsi;
    match ctx.signals.momentum {
        Momentum::Oversold => Some(format!(
            "RSI {rsi:.1} is below {:.0} (oversold)",
            ctx.thresholds.oversold
        )),
        Momentum::Overbought => Some(format!(
            "RSI {rsi:.1} is above {:.0} (overbought)",
            ctx.thresholds.overbought
        )),
        Momentum::Neutral => None,
    }
}
