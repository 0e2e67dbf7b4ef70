use chrono::NaiveDate;

use crate::dates;

pub const DEFAULT_TREND_DAYS: usize = 7;
pub const DEFAULT_RECENT_LIMIT: usize = 5;
pub const MAX_TREND_DAYS: usize = 366;
/// Students below this attendance rate are flagged at risk.
pub const AT_RISK_ATTENDANCE_RATE: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryConfig {
    pub reference_date: NaiveDate,
    pub trend_days: usize,
    pub recent_limit: usize,
    pub at_risk_below: f64,
}

impl SummaryConfig {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            trend_days: DEFAULT_TREND_DAYS,
            recent_limit: DEFAULT_RECENT_LIMIT,
            at_risk_below: AT_RISK_ATTENDANCE_RATE,
        }
    }

    pub fn with_trend_days(mut self, trend_days: usize) -> Self {
        self.trend_days = trend_days.clamp(1, MAX_TREND_DAYS);
        self
    }

    pub fn with_recent_limit(mut self, recent_limit: usize) -> Self {
        self.recent_limit = recent_limit;
        self
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self::new(dates::today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_days_stay_within_bounds() {
        let reference = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        assert_eq!(SummaryConfig::new(reference).with_trend_days(0).trend_days, 1);
        assert_eq!(SummaryConfig::new(reference).with_trend_days(30).trend_days, 30);
        assert_eq!(
            SummaryConfig::new(reference).with_trend_days(10_000).trend_days,
            MAX_TREND_DAYS
        );
    }

    #[test]
    fn defaults_match_dashboard_widgets() {
        let config = SummaryConfig::default();
        assert_eq!(config.trend_days, DEFAULT_TREND_DAYS);
        assert_eq!(config.recent_limit, DEFAULT_RECENT_LIMIT);
        assert_eq!(config.reference_date, dates::today());
    }
}
