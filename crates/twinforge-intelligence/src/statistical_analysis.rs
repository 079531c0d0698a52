// ABOUTME: Statistical analysis for sparse time series
// ABOUTME: Ordinary least-squares regression over (x, y) samples with fit quality measures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use serde::{Deserialize, Serialize};
use twinforge_core::errors::{AppError, AppResult};

/// Linear regression results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Slope of the regression line (y units per x unit)
    pub slope: f64,
    /// Y-intercept of the regression line
    pub intercept: f64,
    /// Coefficient of determination (goodness of fit, 0-1)
    pub r_squared: f64,
    /// Pearson correlation coefficient (-1 to 1)
    pub correlation: f64,
    /// Number of samples
    pub sample_count: usize,
}

impl RegressionResult {
    /// Value of the fitted line at `x`
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }
}

/// Statistical helpers
pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Ordinary least-squares fit of `y` against `x`
    ///
    /// # Errors
    ///
    /// Returns an error with fewer than 2 samples, when all `x` are equal, or
    /// when a sample is not finite
    pub fn linear_regression(samples: &[(f64, f64)]) -> AppResult<RegressionResult> {
        if samples.len() < 2 {
            return Err(AppError::invalid_input(format!(
                "Insufficient data points for regression: need at least 2, got {}",
                samples.len()
            )));
        }
        if samples.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(AppError::invalid_input(
                "Cannot calculate regression: non-finite sample",
            ));
        }

        let n = samples.len() as f64;
        let sum_x = samples.iter().map(|(x, _)| x).sum::<f64>();
        let sum_y = samples.iter().map(|(_, y)| y).sum::<f64>();
        let sum_xx = samples.iter().map(|(x, _)| x * x).sum::<f64>();
        let sum_xy = samples.iter().map(|(x, y)| x * y).sum::<f64>();
        let sum_yy = samples.iter().map(|(_, y)| y * y).sum::<f64>();

        let mean_x = sum_x / n;
        let mean_y = sum_y / n;

        let denominator = (n * mean_x).mul_add(-mean_x, sum_xx);
        if denominator.abs() < f64::EPSILON {
            return Err(AppError::invalid_input(
                "Cannot calculate regression: zero variance in x",
            ));
        }

        let numerator = (n * mean_x).mul_add(-mean_y, sum_xy);
        let slope = numerator / denominator;
        let intercept = slope.mul_add(-mean_x, mean_y);

        let variance_y = (n * mean_y).mul_add(-mean_y, sum_yy);
        let denominator_corr = (denominator * variance_y).sqrt();
        let correlation = if denominator_corr == 0.0 {
            0.0
        } else {
            numerator / denominator_corr
        };

        Ok(RegressionResult {
            slope,
            intercept,
            r_squared: correlation * correlation,
            correlation,
            sample_count: samples.len(),
        })
    }

    /// Arithmetic mean, `None` for an empty slice
    #[must_use]
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    /// Population standard deviation, `None` for an empty slice
    #[must_use]
    pub fn std_dev(values: &[f64]) -> Option<f64> {
        let mean = Self::mean(values)?;
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        Some(variance.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_point_slope() {
        let fit = StatisticalAnalyzer::linear_regression(&[(0.0, 90.0), (14.0, 88.6)]).unwrap();
        assert!((fit.slope + 0.1).abs() < 1e-9);
        assert!((fit.intercept - 90.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_noisy_fit() {
        let samples = [(0.0, 80.0), (1.0, 80.4), (2.0, 79.6), (3.0, 79.9), (4.0, 79.2)];
        let fit = StatisticalAnalyzer::linear_regression(&samples).unwrap();
        assert!(fit.slope < 0.0);
        assert!(fit.r_squared > 0.0 && fit.r_squared < 1.0);
        assert!((fit.predict(2.0) - 79.82).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        assert!(StatisticalAnalyzer::linear_regression(&[(0.0, 1.0)]).is_err());
        assert!(StatisticalAnalyzer::linear_regression(&[(3.0, 1.0), (3.0, 2.0)]).is_err());
        assert!(StatisticalAnalyzer::linear_regression(&[(0.0, f64::NAN), (1.0, 2.0)]).is_err());
    }

    #[test]
    fn test_std_dev() {
        let sd = StatisticalAnalyzer::std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0).abs() < 1e-9);
        assert!(StatisticalAnalyzer::mean(&[]).is_none());
    }
}
