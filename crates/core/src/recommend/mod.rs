pub mod levels;
pub mod rules;

use crate::domain::analysis::Recommendation;
use crate::indicators::IndicatorSet;
use crate::signals::{SignalThresholds, Signals};

pub use rules::{matching_rule, Rule, RULES};

/// Turn classified signals into an action, its reasons and advisory levels.
pub fn synthesize(
    set: &IndicatorSet,
    signals: &Signals,
    thresholds: &SignalThresholds,
) -> Recommendation {
    let rule = matching_rule(signals);
    let ctx = rules::RuleContext {
        set,
        signals,
        thresholds,
    };

    Recommendation {
        action: rule.action,
        reasons: (rule.explain)(&ctx),
        buy_points: levels::buy_points(set),
        sell_points: levels::sell_points(set),
    }
}
