// Straight-line fits through measured stress pairs
use serde::{Deserialize, Serialize};

// numpy.isclose defaults, so "all x equal" matches what users expect from a spreadsheet
const EQUAL_X_ABS_TOLERANCE: f64 = 1e-8;
const EQUAL_X_REL_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitKind {
    /// Least-squares regression through at least two distinct x values
    Regression,
    /// Slope and intercept given directly
    Equation,
    /// All x values equal: flat line at the mean of y
    ConstantMean,
    /// Fewer than two points: the zero function
    Zero,
}

/// `y = slope * x + intercept`, tagged with how it was obtained.
///
/// Degenerate inputs never fail; they produce a `ConstantMean` or `Zero` fit
/// that callers have to be prepared to receive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub kind: FitKind,
}

impl LinearFit {
    pub fn from_equation(slope: f64, intercept: f64) -> Self {
        Self {
            slope,
            intercept,
            kind: FitKind::Equation,
        }
    }

    pub fn zero() -> Self {
        Self {
            slope: 0.0,
            intercept: 0.0,
            kind: FitKind::Zero,
        }
    }

    /// Fit matched x/y samples. Extra values on the longer side are ignored.
    pub fn from_samples(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return Self::zero();
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);
        let count = n as f64;
        let mean_x = xs.iter().sum::<f64>() / count;
        let mean_y = ys.iter().sum::<f64>() / count;

        let first = xs[0];
        let all_equal = xs
            .iter()
            .all(|x| (x - first).abs() <= EQUAL_X_ABS_TOLERANCE + EQUAL_X_REL_TOLERANCE * first.abs());
        if all_equal {
            return Self {
                slope: 0.0,
                intercept: mean_y,
                kind: FitKind::ConstantMean,
            };
        }

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            sxy += dx * (y - mean_y);
            sxx += dx * dx;
        }
        let slope = sxy / sxx;
        Self {
            slope,
            intercept: mean_y - slope * mean_x,
            kind: FitKind::Regression,
        }
    }

    pub fn from_points(points: &[[f64; 2]]) -> Self {
        let xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
        let ys: Vec<f64> = points.iter().map(|p| p[1]).collect();
        Self::from_samples(&xs, &ys)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self.kind, FitKind::ConstantMean | FitKind::Zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collinear_points_are_reproduced_exactly() {
        let fit = LinearFit::from_points(&[[3.1, 1.482], [10.0, 3.0], [18.9, 4.958]]);
        assert_eq!(fit.kind, FitKind::Regression);
        assert!((fit.slope - 0.22).abs() < 1e-12);
        assert!((fit.intercept - 0.8).abs() < 1e-12);
        for (x, y) in [(3.1, 1.482), (10.0, 3.0), (18.9, 4.958)] {
            assert!((fit.eval(x) - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_noisy_points_regression() {
        // Time flow function defaults of the example session
        let fit = LinearFit::from_samples(&[3.1, 18.9], &[1.5, 5.0]);
        assert!((fit.slope - 3.5 / 15.8).abs() < 1e-12);

        let fit = LinearFit::from_samples(&[0.0, 1.0, 2.0, 3.0], &[0.1, 0.9, 2.1, 2.9]);
        assert!((fit.slope - 0.96).abs() < 1e-12);
        assert!((fit.intercept - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_identical_x_gives_mean() {
        let fit = LinearFit::from_samples(&[5.0, 5.0, 5.0], &[1.0, 2.0, 6.0]);
        assert_eq!(fit.kind, FitKind::ConstantMean);
        assert_eq!(fit.slope, 0.0);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!((fit.eval(100.0) - 3.0).abs() < 1e-12);
        assert!(fit.is_degenerate());
    }

    #[test]
    fn test_too_few_points_gives_zero_function() {
        for fit in [
            LinearFit::from_samples(&[], &[]),
            LinearFit::from_samples(&[1.0], &[2.0]),
            LinearFit::from_samples(&[1.0, 2.0], &[2.0]),
        ] {
            assert_eq!(fit, LinearFit::zero());
            assert_eq!(fit.eval(42.0), 0.0);
        }
    }
}
