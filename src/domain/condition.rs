// Reportable, non-fatal conditions raised while computing a design
use serde::Serialize;
use std::fmt;

use super::chart::ChartFamily;

/// The calculation a condition refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    WallYieldLocus,
    InstantaneousFlowFunction,
    TimeFlowFunction,
    MassFlowArching,
    RatholingLowerBound,
    FunnelFlowArching,
    HopperAngle,
    FlowFactor,
}

/// Why a flow-factor line and a flow function have no usable crossing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoIntersection {
    #[error("flow-factor line is parallel to the flow function (slope {slope})")]
    Parallel { slope: f64 },
    #[error("lines cross at negative consolidation stress ({sigma1_kpa} kPa)")]
    BehindOrigin { sigma1_kpa: f64 },
    #[error("root finder did not converge after {iterations} iterations")]
    DidNotConverge { iterations: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// φe lies outside the digitized chart range; the nearest chart was used
    ChartClamped {
        family: ChartFamily,
        requested_deg: f64,
        used_deg: u16,
    },
    /// Input lies outside the digitized range of a chart curve
    Extrapolated {
        family: ChartFamily,
        input: f64,
        min: f64,
        max: f64,
    },
    FlowFactorFloored { computed: f64, floor: f64 },
    InsufficientData { subject: Subject, points: usize },
    NoIntersection { subject: Subject, reason: NoIntersection },
    /// φlin is taken equal to φe; the accuracy of this is unknown
    LinearizedFrictionApproximation { phi_lin_deg: f64 },
    /// Janssen denominator too small; σv = ρb·g·h was used
    JanssenLinearLimit,
    /// Janssen stress for a slot outlet uses a circular silo section
    SimplifiedSiloGeometry,
    RatholeExceedsSilo { diameter_m: f64, silo_diameter_m: f64 },
    ManualChartReading { subject: Subject, value: f64 },
    HopperAngleLimited { computed_deg: f64, used_deg: f64 },
    /// Funnel-flow arching for a conical outlet estimated with the mass-flow outlet formula
    ConicalArchingEstimate { dimension_m: f64 },
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::ChartClamped {
                family,
                requested_deg,
                used_deg,
            } => write!(
                f,
                "phi_e {requested_deg:.1} deg is outside the {family} charts; using {used_deg} deg"
            ),
            Condition::Extrapolated {
                family,
                input,
                min,
                max,
            } => write!(
                f,
                "{input:.2} is outside the digitized {family} range [{min:.2}, {max:.2}]; extrapolated"
            ),
            Condition::FlowFactorFloored { computed, floor } => {
                write!(f, "ratholing flow factor {computed:.2} is below {floor}; using {floor}")
            }
            Condition::InsufficientData { subject, points } => {
                write!(f, "{subject:?} has {points} usable points; at least 2 are needed")
            }
            Condition::NoIntersection { subject, reason } => write!(f, "{subject:?}: {reason}"),
            Condition::LinearizedFrictionApproximation { phi_lin_deg } => write!(
                f,
                "phi_lin approximated by phi_e = {phi_lin_deg:.1} deg"
            ),
            Condition::JanssenLinearLimit => {
                f.write_str("Janssen wall-friction term is negligible; using the hydrostatic limit")
            }
            Condition::SimplifiedSiloGeometry => {
                f.write_str("Janssen stress for a slot outlet uses a circular silo section")
            }
            Condition::RatholeExceedsSilo {
                diameter_m,
                silo_diameter_m,
            } => write!(
                f,
                "upper-bound rathole diameter {diameter_m:.2} m exceeds the silo diameter {silo_diameter_m:.2} m"
            ),
            Condition::ManualChartReading { subject, value } => {
                write!(f, "{subject:?} read manually from the chart: {value:.2}")
            }
            Condition::HopperAngleLimited {
                computed_deg,
                used_deg,
            } => write!(f, "hopper angle {computed_deg:.1} deg limited to {used_deg:.1} deg"),
            Condition::ConicalArchingEstimate { dimension_m } => write!(
                f,
                "conical funnel-flow arching dimension {dimension_m:.3} m is estimated as 2 sigma_c / (rho g)"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_json_is_tagged() {
        let condition = Condition::NoIntersection {
            subject: Subject::MassFlowArching,
            reason: NoIntersection::Parallel { slope: 0.5 },
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["kind"], "no_intersection");
        assert_eq!(json["subject"], "mass_flow_arching");
        assert_eq!(json["reason"]["reason"], "parallel");

        let json = serde_json::to_value(Condition::ChartClamped {
            family: ChartFamily::ConicalBoundary,
            requested_deg: 63.0,
            used_deg: 60,
        })
        .unwrap();
        assert_eq!(json["family"], "conical_boundary");
        assert_eq!(json["used_deg"], 60);
    }

    #[test]
    fn test_conical_arching_estimate_is_labelled() {
        let condition = Condition::ConicalArchingEstimate { dimension_m: 0.1108 };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["kind"], "conical_arching_estimate");
        assert!(condition.to_string().contains("estimated"));
    }
}
