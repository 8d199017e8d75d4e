// Intersection of the flow-factor line with a flow function
use crate::domain::condition::NoIntersection;
use crate::domain::design::{DesignPoint, FlowFunctionCurve};
use crate::domain::error::DesignError;
use crate::domain::units::Kilopascals;

const PARALLEL_TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-10;
const DEFAULT_GUESS_KPA: f64 = 30.0;

pub type IntersectionResult = Result<Result<DesignPoint, NoIntersection>, DesignError>;

fn check_flow_factor(ff: f64) -> Result<(), DesignError> {
    if ff.is_finite() && ff > 0.0 {
        Ok(())
    } else {
        Err(DesignError::invalid("flow_factor", "finite and positive", ff))
    }
}

fn design_point(curve: &FlowFunctionCurve, sigma1: f64) -> Result<DesignPoint, NoIntersection> {
    if sigma1 < 0.0 {
        return Err(NoIntersection::BehindOrigin { sigma1_kpa: sigma1 });
    }
    let sigma1 = Kilopascals(sigma1);
    Ok(DesignPoint {
        sigma1_crit: sigma1,
        sigma_c_crit: curve.strength_at(sigma1),
    })
}

/// Closed-form solution of `m·σ1 + c = σ1/ff`
pub fn intersect(curve: &FlowFunctionCurve, ff: f64) -> IntersectionResult {
    check_flow_factor(ff)?;
    let slope = curve.fit.slope;
    let denominator = 1.0 / ff - slope;
    if denominator.abs() < PARALLEL_TOLERANCE {
        return Ok(Err(NoIntersection::Parallel { slope }));
    }
    Ok(design_point(curve, curve.fit.intercept / denominator))
}

/// Secant iteration on `g(σ1) = FF(σ1) − σ1/ff`
pub fn intersect_iterative(curve: &FlowFunctionCurve, ff: f64, initial_guess: f64) -> IntersectionResult {
    check_flow_factor(ff)?;
    let g = |sigma1: f64| curve.fit.eval(sigma1) - sigma1 / ff;

    let (mut x0, mut x1) = (initial_guess, initial_guess * 1.1 + 1.0);
    let (mut g0, mut g1) = (g(x0), g(x1));
    for _ in 0..MAX_ITERATIONS {
        if (g1 - g0).abs() < PARALLEL_TOLERANCE {
            if g1.abs() < TOLERANCE {
                return Ok(design_point(curve, x1));
            }
            return Ok(Err(NoIntersection::Parallel {
                slope: curve.fit.slope,
            }));
        }
        let x2 = x1 - g1 * (x1 - x0) / (g1 - g0);
        if (x2 - x1).abs() < TOLERANCE * x2.abs().max(1.0) {
            return Ok(design_point(curve, x2));
        }
        (x0, g0) = (x1, g1);
        (x1, g1) = (x2, g(x2));
    }
    Ok(Err(NoIntersection::DidNotConverge {
        iterations: MAX_ITERATIONS,
    }))
}

/// Starting σ1 for the secant method: half the largest measured σ1, or for an
/// equation `σc = m·σ1 + c` a value scaled from its intercept.
pub fn initial_guess(curve: &FlowFunctionCurve, measured_sigma1: &[f64]) -> f64 {
    let max = measured_sigma1.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() && max > 0.0 {
        return max / 2.0;
    }
    let (m, c) = (curve.fit.slope, curve.fit.intercept);
    if m > 0.01 {
        DEFAULT_GUESS_KPA.max(5.0 * c / m)
    } else {
        DEFAULT_GUESS_KPA
    }
}
