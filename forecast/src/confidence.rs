//! Residual-based confidence bands.

/// A projection with per-day lower/upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBand {
    pub predicted: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub confidence_level: f64,
}

/// Approximate z-score for the usual confidence levels.
fn z_score(confidence_level: f64) -> f64 {
    match confidence_level {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        x if x >= 0.80 => 1.282,
        _ => 1.96,
    }
}

impl PredictionBand {
    /// Build a band around `predicted` from the model's fit residuals.
    ///
    /// The standard error grows with sqrt(horizon), so the band widens the
    /// further out the projection goes. With no residuals (or a perfect
    /// fit) the band collapses onto the projection. Lower bounds are
    /// clamped at zero.
    pub fn from_residuals(predicted: &[f64], residuals: &[f64], confidence_level: f64) -> Self {
        let std_dev = if residuals.is_empty() {
            0.0
        } else {
            let n = residuals.len() as f64;
            let mean = residuals.iter().sum::<f64>() / n;
            let variance = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
            variance.sqrt()
        };

        let z = z_score(confidence_level);

        let mut lower = Vec::with_capacity(predicted.len());
        let mut upper = Vec::with_capacity(predicted.len());
        for (day, &point) in predicted.iter().enumerate() {
            let se = std_dev * ((day + 1) as f64).sqrt();
            lower.push((point - z * se).max(0.0));
            upper.push(point + z * se);
        }

        Self {
            predicted: predicted.to_vec(),
            lower,
            upper,
            confidence_level,
        }
    }

    /// Band width per day; monotonically non-decreasing by construction
    /// before the zero clamp kicks in.
    pub fn widths(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(self.lower.iter())
            .map(|(u, l)| u - l)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_contains_projection() {
        let predicted = vec![100.0, 110.0, 120.0];
        let residuals = vec![-3.0, 5.0, -2.0, 4.0];
        let band = PredictionBand::from_residuals(&predicted, &residuals, 0.95);

        for i in 0..predicted.len() {
            assert!(band.lower[i] <= band.predicted[i]);
            assert!(band.predicted[i] <= band.upper[i]);
        }
    }

    #[test]
    fn test_band_widens_with_horizon() {
        let predicted = vec![100.0; 5];
        let residuals = vec![-3.0, 5.0, -2.0, 4.0];
        let band = PredictionBand::from_residuals(&predicted, &residuals, 0.95);

        let widths = band.widths();
        for pair in widths.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_no_residuals_collapses_band() {
        let predicted = vec![10.0, 20.0];
        let band = PredictionBand::from_residuals(&predicted, &[], 0.95);
        assert_eq!(band.lower, predicted);
        assert_eq!(band.upper, predicted);
    }

    #[test]
    fn test_lower_bound_clamped_at_zero() {
        let predicted = vec![1.0; 10];
        let residuals = vec![-50.0, 50.0, -40.0, 40.0];
        let band = PredictionBand::from_residuals(&predicted, &residuals, 0.99);
        assert!(band.lower.iter().all(|&l| l >= 0.0));
    }

    #[test]
    fn test_higher_confidence_is_wider() {
        let predicted = vec![100.0; 3];
        let residuals = vec![-3.0, 5.0, -2.0, 4.0];
        let narrow = PredictionBand::from_residuals(&predicted, &residuals, 0.80);
        let wide = PredictionBand::from_residuals(&predicted, &residuals, 0.99);
        assert!(wide.widths()[0] > narrow.widths()[0]);
    }
}
