//! Exponential smoothing over daily case counts.
//!
//! Recurrences:
//!
//! - level only: `L_t = α·Y_t + (1-α)·L_{t-1}`
//! - level + trend: `L_t = α·Y_t + (1-α)·(L_{t-1}+T_{t-1})`,
//!   `T_t = β·(L_t - L_{t-1}) + (1-β)·T_{t-1}`
//!
//! Both models keep their one-step-ahead residuals from fitting; the
//! confidence band is built from those.

use crate::error::{ForecastError, Result};

/// Fit/project interface shared by the registered models.
pub trait Forecaster: Send + Sync {
    /// Fit to a daily series, oldest observation first.
    fn fit(&mut self, counts: &[f64]) -> Result<()>;

    /// Project `days` values past the end of the fitted series.
    /// Projections are clamped at zero.
    fn project(&self, days: usize) -> Result<Vec<f64>>;

    fn is_fitted(&self) -> bool;

    /// One-step-ahead residuals recorded while fitting. Empty before fit.
    fn residuals(&self) -> &[f64];

    /// Current smoothed level.
    fn level(&self) -> f64;

    /// Estimated daily case growth. Zero for level-only models.
    fn trend_per_day(&self) -> f64;
}

fn check_alpha(name: &'static str, value: f64) -> Result<()> {
    if !(0.0 < value && value < 1.0) {
        return Err(ForecastError::InvalidParameter {
            name,
            reason: "must be between 0 and 1 (exclusive)",
        });
    }
    Ok(())
}

/// Level-only smoothing; projects a flat line.
#[derive(Debug, Clone)]
pub struct LevelModel {
    alpha: f64,
    level: f64,
    residuals: Vec<f64>,
    fitted: bool,
}

impl LevelModel {
    pub fn new(alpha: f64) -> Result<Self> {
        check_alpha("alpha", alpha)?;
        Ok(Self {
            alpha,
            level: 0.0,
            residuals: Vec::new(),
            fitted: false,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Forecaster for LevelModel {
    fn fit(&mut self, counts: &[f64]) -> Result<()> {
        if counts.len() < 2 {
            return Err(ForecastError::InsufficientData {
                required: 2,
                actual: counts.len(),
            });
        }

        self.level = counts[0];
        self.residuals.clear();

        for &observed in &counts[1..] {
            self.residuals.push(observed - self.level);
            self.level = self.alpha * observed + (1.0 - self.alpha) * self.level;
        }

        self.fitted = true;
        Ok(())
    }

    fn project(&self, days: usize) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(ForecastError::NotFitted);
        }
        Ok(vec![self.level.max(0.0); days])
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn level(&self) -> f64 {
        self.level
    }

    fn trend_per_day(&self) -> f64 {
        0.0
    }
}

/// Level + trend smoothing; projects a line.
#[derive(Debug, Clone)]
pub struct TrendModel {
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
    residuals: Vec<f64>,
    fitted: bool,
}

impl TrendModel {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        check_alpha("alpha", alpha)?;
        check_alpha("beta", beta)?;
        Ok(Self {
            alpha,
            beta,
            level: 0.0,
            trend: 0.0,
            residuals: Vec::new(),
            fitted: false,
        })
    }

    pub fn components(&self) -> (f64, f64) {
        (self.level, self.trend)
    }
}

impl Forecaster for TrendModel {
    fn fit(&mut self, counts: &[f64]) -> Result<()> {
        if counts.len() < 3 {
            return Err(ForecastError::InsufficientData {
                required: 3,
                actual: counts.len(),
            });
        }

        self.level = counts[0];
        self.trend = counts[1] - counts[0];
        self.residuals.clear();

        for &observed in &counts[1..] {
            self.residuals.push(observed - (self.level + self.trend));

            let prev_level = self.level;
            self.level = self.alpha * observed + (1.0 - self.alpha) * (self.level + self.trend);
            self.trend = self.beta * (self.level - prev_level) + (1.0 - self.beta) * self.trend;
        }

        self.fitted = true;
        Ok(())
    }

    fn project(&self, days: usize) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(ForecastError::NotFitted);
        }

        let mut projection = Vec::with_capacity(days);
        for day in 1..=days {
            projection.push((self.level + day as f64 * self.trend).max(0.0));
        }
        Ok(projection)
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn level(&self) -> f64 {
        self.level
    }

    fn trend_per_day(&self) -> f64 {
        self.trend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_model_is_flat() {
        let mut model = LevelModel::new(0.3).unwrap();
        model.fit(&[10.0, 12.0, 11.0, 13.0, 12.0]).unwrap();

        let projection = model.project(4).unwrap();
        assert_eq!(projection.len(), 4);
        assert!(projection.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_trend_model_follows_linear_growth() {
        let counts: Vec<f64> = (0..10).map(|d| 5.0 + 4.0 * d as f64).collect();
        let mut model = TrendModel::new(0.5, 0.3).unwrap();
        model.fit(&counts).unwrap();

        let projection = model.project(3).unwrap();
        assert!(projection[0] > *counts.last().unwrap());
        assert!(projection[2] > projection[0]);
    }

    #[test]
    fn test_projection_clamped_at_zero() {
        // Steeply falling series drives the linear projection negative.
        let counts: Vec<f64> = (0..10).map(|d| 90.0 - 10.0 * d as f64).collect();
        let mut model = TrendModel::new(0.5, 0.3).unwrap();
        model.fit(&counts).unwrap();

        let projection = model.project(30).unwrap();
        assert!(projection.iter().all(|&c| c >= 0.0));
        assert_eq!(*projection.last().unwrap(), 0.0);
    }

    #[test]
    fn test_alpha_out_of_range() {
        assert!(LevelModel::new(0.0).is_err());
        assert!(LevelModel::new(1.0).is_err());
        assert!(TrendModel::new(0.5, 1.5).is_err());
    }

    #[test]
    fn test_insufficient_data() {
        let mut level = LevelModel::new(0.3).unwrap();
        assert_eq!(
            level.fit(&[1.0]),
            Err(ForecastError::InsufficientData {
                required: 2,
                actual: 1
            })
        );

        let mut trend = TrendModel::new(0.3, 0.1).unwrap();
        assert!(trend.fit(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_project_before_fit() {
        let model = LevelModel::new(0.3).unwrap();
        assert_eq!(model.project(3), Err(ForecastError::NotFitted));
    }

    #[test]
    fn test_residuals_recorded() {
        let mut model = LevelModel::new(0.3).unwrap();
        model.fit(&[10.0, 12.0, 11.0]).unwrap();
        assert_eq!(model.residuals().len(), 2);
    }

    #[test]
    fn test_zero_day_projection_is_empty() {
        let mut model = LevelModel::new(0.3).unwrap();
        model.fit(&[10.0, 12.0]).unwrap();
        assert!(model.project(0).unwrap().is_empty());
    }
}
