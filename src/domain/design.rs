// Design session inputs and results
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::linear_fit::LinearFit;
use super::units::Kilopascals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowPattern {
    MassFlow,
    FunnelFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HopperShape {
    Conical,
    /// Plane-flow hopper with a slot outlet
    #[serde(alias = "plane-flow")]
    Slot,
}

/// A measured straight line: either test points or a stated equation.
/// Stresses are in kPa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LineInput {
    Points { points: Vec<[f64; 2]> },
    Equation { slope: f64, intercept: f64 },
}

impl LineInput {
    pub fn points(points: &[[f64; 2]]) -> Self {
        LineInput::Points {
            points: points.to_vec(),
        }
    }

    pub fn fit(&self) -> LinearFit {
        match self {
            LineInput::Points { points } => LinearFit::from_points(points),
            LineInput::Equation { slope, intercept } => LinearFit::from_equation(*slope, *intercept),
        }
    }
}

/// Everything one design session needs. This is also the persisted session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignInputs {
    pub solid_name: String,
    pub wall_material: String,
    /// kg/m³
    pub bulk_density: f64,
    /// Effective angle of internal friction φe, degrees
    pub effective_friction_deg: f64,
    /// Wall shear vs. wall normal stress
    pub wall_yield_locus: LineInput,
    pub instantaneous_flow_function: LineInput,
    pub time_flow_function: LineInput,
    pub flow_pattern: FlowPattern,
    pub hopper_shape: HopperShape,
    /// Hopper angle read off the chart by hand, degrees
    pub manual_hopper_angle_deg: Option<f64>,
    /// Flow factor read off the chart by hand
    pub manual_flow_factor: Option<f64>,
    pub fill_height_m: f64,
    pub silo_diameter_m: f64,
    /// Janssen lateral stress ratio K
    pub janssen_k: f64,
}

impl Default for DesignInputs {
    fn default() -> Self {
        Self {
            solid_name: "Iron Concentrate".to_string(),
            wall_material: "Stainless Steel 304".to_string(),
            bulk_density: 2400.0,
            effective_friction_deg: 50.0,
            wall_yield_locus: LineInput::points(&[[3.1, 1.4], [12.4, 4.9]]),
            instantaneous_flow_function: LineInput::points(&[[3.1, 0.6], [18.9, 2.5]]),
            time_flow_function: LineInput::points(&[[3.1, 1.5], [18.9, 5.0]]),
            flow_pattern: FlowPattern::MassFlow,
            hopper_shape: HopperShape::Conical,
            manual_hopper_angle_deg: None,
            manual_flow_factor: None,
            fill_height_m: 6.0,
            silo_diameter_m: 3.0,
            janssen_k: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowFunctionKind {
    Instantaneous,
    Time,
}

/// Unconfined yield strength σc as a function of consolidation stress σ1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowFunctionCurve {
    pub kind: FlowFunctionKind,
    pub fit: LinearFit,
}

impl FlowFunctionCurve {
    pub fn new(kind: FlowFunctionKind, fit: LinearFit) -> Self {
        Self { kind, fit }
    }

    pub fn strength_at(&self, sigma1: Kilopascals) -> Kilopascals {
        Kilopascals(self.fit.eval(sigma1.value()))
    }
}

/// Where a flow-factor line crosses the flow function
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DesignPoint {
    pub sigma1_crit: Kilopascals,
    pub sigma_c_crit: Kilopascals,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WallFriction {
    pub angle_deg: f64,
    pub fit: LinearFit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MassFlowDesign {
    pub chart_phi_e: u16,
    pub boundary_angle_deg: f64,
    pub hopper_angle_deg: f64,
    pub flow_factor: f64,
    pub critical: Option<DesignPoint>,
    pub outlet_m: Option<f64>,
    pub geometry_factor: f64,
    pub geometry_corrected_outlet_m: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatholingFlowFactor {
    /// Value from the formula before the floor
    pub computed: f64,
    pub value: f64,
    pub floored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatholeBound {
    pub sigma1: Kilopascals,
    pub sigma_c: Kilopascals,
    pub diameter_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArchingCheck {
    pub flow_factor: f64,
    pub critical: DesignPoint,
    pub geometry_factor: f64,
    pub dimension_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelFlowDesign {
    /// Steepest wall inclination that still empties completely
    pub clearance_angle_deg: f64,
    pub phi_lin_deg: f64,
    pub f_phi_i: f64,
    pub ratholing_flow_factor: RatholingFlowFactor,
    /// Emptying condition, from the ratholing flow factor
    pub lower_bound: Option<RatholeBound>,
    pub max_vertical_stress: Kilopascals,
    /// Filling condition, from the Janssen stress at the silo base
    pub upper_bound: RatholeBound,
    pub arching: Option<ArchingCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignReport {
    pub solid_name: String,
    pub wall_material: String,
    pub flow_pattern: FlowPattern,
    pub hopper_shape: HopperShape,
    pub bulk_density: f64,
    pub effective_friction_deg: f64,
    pub wall_friction: WallFriction,
    pub instantaneous_flow_function: FlowFunctionCurve,
    pub time_flow_function: FlowFunctionCurve,
    pub mass_flow: Option<MassFlowDesign>,
    pub funnel_flow: Option<FunnelFlowDesign>,
    /// Largest of all critical outlet and rathole dimensions, metres
    pub governing_dimension_m: Option<f64>,
    pub conditions: Vec<Condition>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_input_serde_shape() {
        let json = r#"{"method":"equation","slope":0.22,"intercept":0.8}"#;
        let input: LineInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.fit(), LinearFit::from_equation(0.22, 0.8));

        let json = r#"{"method":"points","points":[[3.1,1.5],[18.9,5.0]]}"#;
        let input: LineInput = serde_json::from_str(json).unwrap();
        assert_eq!(input, LineInput::points(&[[3.1, 1.5], [18.9, 5.0]]));
    }

    #[test]
    fn test_partial_session_takes_defaults() {
        let json = r#"{"bulk_density":1500.0,"hopper_shape":"plane-flow","flow_pattern":"funnel-flow"}"#;
        let inputs: DesignInputs = serde_json::from_str(json).unwrap();
        assert_eq!(inputs.bulk_density, 1500.0);
        assert_eq!(inputs.hopper_shape, HopperShape::Slot);
        assert_eq!(inputs.flow_pattern, FlowPattern::FunnelFlow);
        assert_eq!(inputs.solid_name, "Iron Concentrate");
        assert_eq!(inputs.manual_flow_factor, None);
    }
}
