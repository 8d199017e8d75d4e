// Closed-form hopper design formulas
use std::f64::consts::PI;

use crate::domain::design::{HopperShape, RatholingFlowFactor};
use crate::domain::error::DesignError;
use crate::domain::units::{Kilopascals, Pascals};

// Below this λh the exponential form loses all precision
const JANSSEN_LINEAR_LIMIT: f64 = 1e-9;

/// Ratholing flow factor `ffp = (1 + sin φe) / (4 sin φe) · f(φi)`, raised to `floor` when lower.
///
/// A non-positive `f(φi)` (the chart extrapolated below zero) is rejected rather than floored.
pub fn ratholing_flow_factor(
    phi_e_deg: f64,
    f_phi_i: f64,
    floor: f64,
) -> Result<RatholingFlowFactor, DesignError> {
    let sin_phi = phi_e_deg.to_radians().sin();
    if !(sin_phi > 0.0) {
        return Err(DesignError::invalid("effective_friction_deg", "an angle with positive sine", phi_e_deg));
    }
    if !(f_phi_i.is_finite() && f_phi_i > 0.0) {
        return Err(DesignError::invalid("f_phi_i", "finite and positive", f_phi_i));
    }
    let computed = (1.0 + sin_phi) / (4.0 * sin_phi) * f_phi_i;
    let floored = computed < floor;
    Ok(RatholingFlowFactor {
        computed,
        value: if floored { floor } else { computed },
        floored,
    })
}

/// Inputs of the Janssen vertical stress at depth
#[derive(Debug, Clone, Copy)]
pub struct JanssenParams {
    /// kg/m³
    pub bulk_density: f64,
    pub gravity: f64,
    /// Lateral stress ratio K
    pub k: f64,
    pub wall_friction_deg: f64,
    /// Cross-section area, m²
    pub area: f64,
    /// Cross-section perimeter, m
    pub perimeter: f64,
    /// Fill height, m
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JanssenStress {
    pub sigma_v: Pascals,
    /// The hydrostatic limit ρb·g·h was used
    pub linear_limit: bool,
}

/// Circular section of diameter `d`: (area, perimeter)
pub fn circular_cross_section(diameter_m: f64) -> (f64, f64) {
    (PI * diameter_m * diameter_m / 4.0, PI * diameter_m)
}

/// Vertical stress at depth h, `ρb·g/λ · (1 − exp(−λh))` with `λ = K·tan φx·U/A`
pub fn janssen_max_vertical_stress(params: &JanssenParams) -> Result<JanssenStress, DesignError> {
    let p = params;
    if !(p.k >= 0.0) {
        return Err(DesignError::invalid("janssen_k", "non-negative", p.k));
    }
    if !(p.wall_friction_deg >= 0.0) {
        return Err(DesignError::invalid("wall_friction_deg", "non-negative", p.wall_friction_deg));
    }
    if !(p.height >= 0.0) {
        return Err(DesignError::invalid("fill_height_m", "non-negative", p.height));
    }
    if !(p.area > 0.0) {
        return Err(DesignError::invalid("area", "positive", p.area));
    }
    if !(p.perimeter > 0.0) {
        return Err(DesignError::invalid("perimeter", "positive", p.perimeter));
    }

    let weight = p.bulk_density * p.gravity;
    let lambda = p.k * p.wall_friction_deg.to_radians().tan() * p.perimeter / p.area;
    let lambda_h = lambda * p.height;
    if lambda_h < JANSSEN_LINEAR_LIMIT {
        return Ok(JanssenStress {
            sigma_v: Pascals(weight * p.height),
            linear_limit: true,
        });
    }
    Ok(JanssenStress {
        sigma_v: Pascals(weight * -(-lambda_h).exp_m1() / lambda),
        linear_limit: false,
    })
}

/// `coefficient · σc / (ρb·g)` in metres. A strength of zero or less gives 0.
pub fn critical_length(
    coefficient: f64,
    sigma_c: Kilopascals,
    bulk_density: f64,
    gravity: f64,
) -> Result<f64, DesignError> {
    if !(coefficient.is_finite() && coefficient > 0.0) {
        return Err(DesignError::invalid("length_coefficient", "finite and positive", coefficient));
    }
    if !(bulk_density > 0.0) {
        return Err(DesignError::invalid("bulk_density", "positive", bulk_density));
    }
    if !(gravity > 0.0) {
        return Err(DesignError::invalid("gravity", "positive", gravity));
    }
    let sigma_c = sigma_c.to_pascals();
    if !(sigma_c.value() > 0.0) {
        return Ok(0.0);
    }
    Ok(coefficient * sigma_c.value() / (bulk_density * gravity))
}

/// Minimum outlet against arching: diameter for conical, slot width for plane flow
pub fn outlet_dimension(
    shape: HopperShape,
    sigma_c: Kilopascals,
    bulk_density: f64,
    gravity: f64,
) -> Result<f64, DesignError> {
    let coefficient = match shape {
        HopperShape::Conical => 2.0,
        HopperShape::Slot => 1.0,
    };
    critical_length(coefficient, sigma_c, bulk_density, gravity)
}

/// Outlet using the chart geometry coefficient H(Θ)
pub fn geometry_corrected_outlet(
    h_theta: f64,
    sigma_c: Kilopascals,
    bulk_density: f64,
    gravity: f64,
) -> Result<f64, DesignError> {
    critical_length(h_theta, sigma_c, bulk_density, gravity)
}

pub fn rathole_diameter(
    f_phi_i: f64,
    sigma_c: Kilopascals,
    bulk_density: f64,
    gravity: f64,
) -> Result<f64, DesignError> {
    critical_length(f_phi_i, sigma_c, bulk_density, gravity)
}

/// Steepest funnel-flow wall that still clears completely, degrees from vertical
pub fn clearance_angle(limit_deg: f64, wall_friction_deg: f64) -> f64 {
    limit_deg - wall_friction_deg
}
