//! Risk labeling for a fitted region.

use models::RiskLevel;

/// Daily case level at which a region is critical regardless of trend.
const CRITICAL_LEVEL: f64 = 500.0;
const HIGH_LEVEL: f64 = 200.0;
const MODERATE_LEVEL: f64 = 50.0;

/// Relative daily growth (trend / level) thresholds.
const CRITICAL_GROWTH: f64 = 0.15;
const HIGH_GROWTH: f64 = 0.05;

/// Label a region from its smoothed level and daily trend.
///
/// Growth is judged relative to the level so that +5 cases/day means
/// something different at 20 cases than at 2000.
pub fn risk_level(level: f64, trend_per_day: f64) -> RiskLevel {
    let growth = trend_per_day / level.max(1.0);

    if level >= CRITICAL_LEVEL || growth >= CRITICAL_GROWTH {
        RiskLevel::Critical
    } else if level >= HIGH_LEVEL || growth >= HIGH_GROWTH {
        RiskLevel::High
    } else if level >= MODERATE_LEVEL || growth > 0.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_region_is_low() {
        assert_eq!(risk_level(10.0, 0.0), RiskLevel::Low);
        assert_eq!(risk_level(10.0, -2.0), RiskLevel::Low);
    }

    #[test]
    fn test_any_growth_is_at_least_moderate() {
        assert_eq!(risk_level(10.0, 0.1), RiskLevel::Moderate);
    }

    #[test]
    fn test_high_by_level_or_growth() {
        assert_eq!(risk_level(250.0, 0.0), RiskLevel::High);
        assert_eq!(risk_level(100.0, 6.0), RiskLevel::High);
    }

    #[test]
    fn test_critical_by_level_or_growth() {
        assert_eq!(risk_level(600.0, 0.0), RiskLevel::Critical);
        assert_eq!(risk_level(100.0, 20.0), RiskLevel::Critical);
    }

    #[test]
    fn test_growth_is_relative_to_level() {
        // +5/day on a small region is explosive, on a large one is noise.
        assert_eq!(risk_level(25.0, 5.0), RiskLevel::Critical);
        assert_eq!(risk_level(180.0, 5.0), RiskLevel::Moderate);
    }
}
