use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

// US equities by default: UTC-5, fixed (no DST adjustment).
const DEFAULT_UTC_OFFSET_HOURS: i32 = -5;

// Before this local time the latest completed session is the previous one.
const CLOSE_CUTOFF_HOUR: u32 = 16;
const CLOSE_CUTOFF_MINUTE: u32 = 30;

pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid as-of date {s:?} (expected YYYY-MM-DD)"));
    }

    let offset_hours = std::env::var("MARKET_UTC_OFFSET_HOURS")
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
    let tz = chrono::FixedOffset::east_opt(offset_hours * 3600)
        .with_context(|| format!("invalid market UTC offset: {offset_hours}h"))?;
    let now_local = now_utc.with_timezone(&tz);

    let cutoff_reached =
        (now_local.hour(), now_local.minute()) >= (CLOSE_CUTOFF_HOUR, CLOSE_CUTOFF_MINUTE);
    let mut date = now_local.date_naive();
    if !cutoff_reached {
        date = date - Duration::days(1);
    }

    Ok(roll_back_to_trading_day(date, &configured_holidays()))
}

/// The last `count` trading days ending at `end` (inclusive if `end` trades),
/// in ascending order.
pub fn trading_days_ending(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let holidays = configured_holidays();
    let mut out = Vec::with_capacity(count);
    let mut date = roll_back_to_trading_day(end, &holidays);
    while out.len() < count {
        out.push(date);
        date = roll_back_to_trading_day(date - Duration::days(1), &holidays);
    }
    out.reverse();
    out
}

/// Number of trading days in a calendar lookback, ignoring holidays.
pub fn approx_trading_days(lookback_days: u32) -> usize {
    (lookback_days as usize * 5).div_ceil(7)
}

fn roll_back_to_trading_day(mut date: NaiveDate, holidays: &HashSet<NaiveDate>) -> NaiveDate {
    while is_weekend(date) || holidays.contains(&date) {
        date = date - Duration::days(1);
    }
    date
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

fn configured_holidays() -> HashSet<NaiveDate> {
    // Fixed-date closures only; extend via MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
    let mut out = HashSet::new();
    for y in 2024..=2030 {
        for (m, d) in [(1, 1), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                out.insert(date);
            }
        }
    }

    if let Ok(s) = std::env::var("MARKET_HOLIDAYS") {
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Ok(d) = NaiveDate::parse_from_str(part, "%Y-%m-%d") {
                out.insert(d);
            }
        }
    }

    out
}
