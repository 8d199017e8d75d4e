// Design service - Use case for running one hopper design session
use std::sync::Arc;

use crate::application::chart_interpolator::{ChartInterpolator, Reading};
use crate::application::chart_source::ChartSource;
use crate::application::formulas::{
    JanssenParams, circular_cross_section, clearance_angle, geometry_corrected_outlet, janssen_max_vertical_stress,
    outlet_dimension, rathole_diameter, ratholing_flow_factor,
};
use crate::application::intersection::{IntersectionResult, initial_guess, intersect, intersect_iterative};
use crate::domain::chart::{ChartFamily, ChartSummary};
use crate::domain::condition::{Condition, Subject};
use crate::domain::design::{
    ArchingCheck, DesignInputs, DesignPoint, DesignReport, FlowFunctionCurve, FlowFunctionKind, FlowPattern,
    FunnelFlowDesign, HopperShape, LineInput, MassFlowDesign, RatholeBound, WallFriction,
};
use crate::domain::error::DesignError;
use crate::infrastructure::config::{DesignSettings, SolverKind};

// Wall points at lower normal stress than this carry no friction information
const MIN_WALL_STRESS_KPA: f64 = 1e-6;

#[derive(Clone)]
pub struct DesignService {
    charts: ChartInterpolator,
    settings: DesignSettings,
}

/// Conditions collected while one session is computed
#[derive(Default)]
struct Conditions(Vec<Condition>);

impl Conditions {
    fn push(&mut self, condition: Condition) {
        tracing::warn!("{}", condition);
        self.0.push(condition);
    }

    fn take<T>(&mut self, reading: Reading<T>) -> T {
        if let Some(condition) = reading.condition {
            self.push(condition);
        }
        reading.value
    }

    /// Keep a design point, or record why there is none
    fn intersection(
        &mut self,
        subject: Subject,
        result: IntersectionResult,
    ) -> Result<Option<DesignPoint>, DesignError> {
        match result? {
            Ok(point) => Ok(Some(point)),
            Err(reason) => {
                self.push(Condition::NoIntersection { subject, reason });
                Ok(None)
            }
        }
    }
}

impl DesignService {
    pub fn new(source: Arc<dyn ChartSource>, settings: DesignSettings) -> Self {
        Self {
            charts: ChartInterpolator::new(source),
            settings,
        }
    }

    pub fn chart_summary(&self) -> Vec<ChartSummary> {
        self.charts.source().summary()
    }

    pub fn design(&self, inputs: &DesignInputs) -> Result<DesignReport, DesignError> {
        validate(inputs)?;
        let mut conditions = Conditions::default();

        let wall_friction = self.wall_friction(&inputs.wall_yield_locus, &mut conditions);
        let instantaneous = flow_function(
            FlowFunctionKind::Instantaneous,
            &inputs.instantaneous_flow_function,
            Subject::InstantaneousFlowFunction,
            &mut conditions,
        );
        let time = flow_function(
            FlowFunctionKind::Time,
            &inputs.time_flow_function,
            Subject::TimeFlowFunction,
            &mut conditions,
        );

        let (mass_flow, funnel_flow, governing_dimension_m) = match inputs.flow_pattern {
            FlowPattern::MassFlow => {
                let design = self.mass_flow(inputs, wall_friction.angle_deg, &time, &mut conditions)?;
                let governing = max_dimension([design.outlet_m, design.geometry_corrected_outlet_m]);
                (Some(design), None, governing)
            }
            FlowPattern::FunnelFlow => {
                let design = self.funnel_flow(inputs, wall_friction.angle_deg, &time, &mut conditions)?;
                let governing = max_dimension([
                    design.lower_bound.map(|b| b.diameter_m),
                    Some(design.upper_bound.diameter_m),
                    design.arching.map(|a| a.dimension_m),
                ]);
                (None, Some(design), governing)
            }
        };

        tracing::info!(
            "Designed {:?} {:?} hopper for {}: governing dimension {:?} m, {} conditions",
            inputs.flow_pattern,
            inputs.hopper_shape,
            inputs.solid_name,
            governing_dimension_m,
            conditions.0.len()
        );

        Ok(DesignReport {
            solid_name: inputs.solid_name.clone(),
            wall_material: inputs.wall_material.clone(),
            flow_pattern: inputs.flow_pattern,
            hopper_shape: inputs.hopper_shape,
            bulk_density: inputs.bulk_density,
            effective_friction_deg: inputs.effective_friction_deg,
            wall_friction,
            instantaneous_flow_function: instantaneous,
            time_flow_function: time,
            mass_flow,
            funnel_flow,
            governing_dimension_m,
            conditions: conditions.0,
            generated_at: chrono::Utc::now(),
        })
    }

    /// φx from the wall yield locus
    fn wall_friction(&self, locus: &LineInput, conditions: &mut Conditions) -> WallFriction {
        let fit = locus.fit();
        let angle_deg = match locus {
            LineInput::Points { points } => {
                let angles: Vec<f64> = points
                    .iter()
                    .filter(|p| p[0] > MIN_WALL_STRESS_KPA)
                    .map(|p| (p[1] / p[0]).atan().to_degrees())
                    .collect();
                if angles.len() < 2 {
                    conditions.push(Condition::InsufficientData {
                        subject: Subject::WallYieldLocus,
                        points: angles.len(),
                    });
                    0.0
                } else {
                    angles.iter().sum::<f64>() / angles.len() as f64
                }
            }
            LineInput::Equation { slope, intercept } => {
                let sigma = self.settings.reference_wall_stress_kpa;
                if sigma.is_finite() && sigma > 0.0 {
                    ((slope * sigma + intercept) / sigma).atan().to_degrees()
                } else {
                    conditions.push(Condition::InsufficientData {
                        subject: Subject::WallYieldLocus,
                        points: 0,
                    });
                    0.0
                }
            }
        };
        WallFriction { angle_deg, fit }
    }

    fn mass_flow(
        &self,
        inputs: &DesignInputs,
        phi_x: f64,
        time: &FlowFunctionCurve,
        conditions: &mut Conditions,
    ) -> Result<MassFlowDesign, DesignError> {
        let shape = inputs.hopper_shape;
        let (rho, g) = (inputs.bulk_density, self.settings.gravity);

        let phi_e = conditions.take(
            self.charts
                .snap_phi_e(ChartFamily::boundary(shape), inputs.effective_friction_deg)?,
        );
        let boundary = conditions.take(self.charts.boundary_angle(shape, phi_e, phi_x)?);

        let hopper_angle = match inputs.manual_hopper_angle_deg {
            Some(value) => {
                conditions.push(Condition::ManualChartReading {
                    subject: Subject::HopperAngle,
                    value,
                });
                value
            }
            None => {
                let computed = boundary - self.settings.safety_margin_deg;
                if computed < 0.0 {
                    conditions.push(Condition::HopperAngleLimited {
                        computed_deg: computed,
                        used_deg: 0.0,
                    });
                    0.0
                } else {
                    computed
                }
            }
        };

        let flow_factor = match inputs.manual_flow_factor {
            Some(value) => {
                conditions.push(Condition::ManualChartReading {
                    subject: Subject::FlowFactor,
                    value,
                });
                value
            }
            None => conditions.take(self.charts.flow_factor(shape, phi_e, hopper_angle, phi_x)?),
        };

        let critical = conditions.intersection(
            Subject::MassFlowArching,
            self.solve(time, flow_factor, &inputs.time_flow_function),
        )?;
        let geometry_factor = conditions.take(self.charts.geometry_coefficient(shape, hopper_angle)?);
        let outlet_m = critical
            .map(|p| outlet_dimension(shape, p.sigma_c_crit, rho, g))
            .transpose()?;
        let geometry_corrected_outlet_m = critical
            .map(|p| geometry_corrected_outlet(geometry_factor, p.sigma_c_crit, rho, g))
            .transpose()?;

        Ok(MassFlowDesign {
            chart_phi_e: phi_e,
            boundary_angle_deg: boundary,
            hopper_angle_deg: hopper_angle,
            flow_factor,
            critical,
            outlet_m,
            geometry_factor,
            geometry_corrected_outlet_m,
        })
    }

    fn funnel_flow(
        &self,
        inputs: &DesignInputs,
        phi_x: f64,
        time: &FlowFunctionCurve,
        conditions: &mut Conditions,
    ) -> Result<FunnelFlowDesign, DesignError> {
        let shape = inputs.hopper_shape;
        let (rho, g) = (inputs.bulk_density, self.settings.gravity);

        let clearance_angle_deg = clearance_angle(self.settings.clearance_limit_deg, phi_x);
        let phi_lin = inputs.effective_friction_deg;
        conditions.push(Condition::LinearizedFrictionApproximation { phi_lin_deg: phi_lin });
        let f_phi_i = conditions.take(self.charts.ratholing_coefficient(phi_lin)?);

        let ffp = ratholing_flow_factor(inputs.effective_friction_deg, f_phi_i, self.settings.ratholing_floor)?;
        if ffp.floored {
            conditions.push(Condition::FlowFactorFloored {
                computed: ffp.computed,
                floor: ffp.value,
            });
        }

        let lower_bound = conditions
            .intersection(
                Subject::RatholingLowerBound,
                self.solve(time, ffp.value, &inputs.time_flow_function),
            )?
            .map(|p| {
                Ok::<_, DesignError>(RatholeBound {
                    sigma1: p.sigma1_crit,
                    sigma_c: p.sigma_c_crit,
                    diameter_m: rathole_diameter(f_phi_i, p.sigma_c_crit, rho, g)?,
                })
            })
            .transpose()?;

        let (area, perimeter) = circular_cross_section(inputs.silo_diameter_m);
        let janssen = janssen_max_vertical_stress(&JanssenParams {
            bulk_density: rho,
            gravity: g,
            k: inputs.janssen_k,
            wall_friction_deg: phi_x,
            area,
            perimeter,
            height: inputs.fill_height_m,
        })?;
        if janssen.linear_limit {
            conditions.push(Condition::JanssenLinearLimit);
        }
        if shape == HopperShape::Slot {
            conditions.push(Condition::SimplifiedSiloGeometry);
        }
        let max_vertical_stress = janssen.sigma_v.to_kilopascals();
        let upper_sigma_c = time.strength_at(max_vertical_stress);
        let upper_bound = RatholeBound {
            sigma1: max_vertical_stress,
            sigma_c: upper_sigma_c,
            diameter_m: rathole_diameter(f_phi_i, upper_sigma_c, rho, g)?,
        };
        if upper_bound.diameter_m > inputs.silo_diameter_m {
            conditions.push(Condition::RatholeExceedsSilo {
                diameter_m: upper_bound.diameter_m,
                silo_diameter_m: inputs.silo_diameter_m,
            });
        }

        let doming_ff = self.settings.doming_flow_factor;
        let arching = conditions
            .intersection(
                Subject::FunnelFlowArching,
                self.solve(time, doming_ff, &inputs.time_flow_function),
            )?
            .map(|critical| {
                let (geometry_factor, dimension_m) = match shape {
                    HopperShape::Conical => (2.0, outlet_dimension(shape, critical.sigma_c_crit, rho, g)?),
                    HopperShape::Slot => {
                        let h = self.settings.slot_doming_geometry;
                        (h, geometry_corrected_outlet(h, critical.sigma_c_crit, rho, g)?)
                    }
                };
                Ok::<_, DesignError>(ArchingCheck {
                    flow_factor: doming_ff,
                    critical,
                    geometry_factor,
                    dimension_m,
                })
            })
            .transpose()?;
        if shape == HopperShape::Conical
            && let Some(arching) = &arching
        {
            conditions.push(Condition::ConicalArchingEstimate {
                dimension_m: arching.dimension_m,
            });
        }

        Ok(FunnelFlowDesign {
            clearance_angle_deg,
            phi_lin_deg: phi_lin,
            f_phi_i,
            ratholing_flow_factor: ffp,
            lower_bound,
            max_vertical_stress,
            upper_bound,
            arching,
        })
    }

    fn solve(&self, curve: &FlowFunctionCurve, ff: f64, measured: &LineInput) -> IntersectionResult {
        match self.settings.solver {
            SolverKind::ClosedForm => intersect(curve, ff),
            SolverKind::Secant => {
                let sigma1: Vec<f64> = match measured {
                    LineInput::Points { points } => points.iter().map(|p| p[0]).collect(),
                    LineInput::Equation { .. } => Vec::new(),
                };
                intersect_iterative(curve, ff, initial_guess(curve, &sigma1))
            }
        }
    }
}

fn flow_function(
    kind: FlowFunctionKind,
    input: &LineInput,
    subject: Subject,
    conditions: &mut Conditions,
) -> FlowFunctionCurve {
    if let LineInput::Points { points } = input
        && points.len() < 2
    {
        conditions.push(Condition::InsufficientData {
            subject,
            points: points.len(),
        });
    }
    let fit = input.fit();
    if fit.is_degenerate() {
        tracing::debug!("{:?} flow function is degenerate: {:?}", kind, fit);
    }
    FlowFunctionCurve::new(kind, fit)
}

fn max_dimension<const N: usize>(dimensions: [Option<f64>; N]) -> Option<f64> {
    dimensions.into_iter().flatten().reduce(f64::max)
}

fn validate(inputs: &DesignInputs) -> Result<(), DesignError> {
    if !(inputs.bulk_density.is_finite() && inputs.bulk_density > 0.0) {
        return Err(DesignError::invalid("bulk_density", "finite and positive", inputs.bulk_density));
    }
    let phi_e = inputs.effective_friction_deg;
    if !(phi_e.is_finite() && phi_e > 0.0 && phi_e < 90.0) {
        return Err(DesignError::invalid("effective_friction_deg", "between 0 and 90 degrees", phi_e));
    }
    if let Some(angle) = inputs.manual_hopper_angle_deg
        && !(angle.is_finite() && angle >= 0.0)
    {
        return Err(DesignError::invalid("manual_hopper_angle_deg", "finite and non-negative", angle));
    }
    if let Some(ff) = inputs.manual_flow_factor
        && !(ff.is_finite() && ff > 0.0)
    {
        return Err(DesignError::invalid("manual_flow_factor", "finite and positive", ff));
    }
    if inputs.flow_pattern == FlowPattern::FunnelFlow {
        if !(inputs.fill_height_m.is_finite() && inputs.fill_height_m >= 0.0) {
            return Err(DesignError::invalid("fill_height_m", "finite and non-negative", inputs.fill_height_m));
        }
        if !(inputs.silo_diameter_m.is_finite() && inputs.silo_diameter_m > 0.0) {
            return Err(DesignError::invalid("silo_diameter_m", "finite and positive", inputs.silo_diameter_m));
        }
        if !(inputs.janssen_k.is_finite() && inputs.janssen_k >= 0.0) {
            return Err(DesignError::invalid("janssen_k", "finite and non-negative", inputs.janssen_k));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::chart_store::bundled_charts;

    fn service(settings: DesignSettings) -> DesignService {
        DesignService::new(Arc::new(bundled_charts().unwrap()), settings)
    }

    /// φe 40, a wall locus at exactly 20°, and σc = 0.22·σ1 + 0.8
    fn mass_flow_inputs() -> DesignInputs {
        let tan = 20f64.to_radians().tan();
        DesignInputs {
            effective_friction_deg: 40.0,
            wall_yield_locus: LineInput::points(&[[5.0, 5.0 * tan], [10.0, 10.0 * tan]]),
            time_flow_function: LineInput::Equation {
                slope: 0.22,
                intercept: 0.8,
            },
            ..DesignInputs::default()
        }
    }

    fn has(report: &DesignReport, matcher: impl Fn(&Condition) -> bool) -> bool {
        report.conditions.iter().any(matcher)
    }

    #[test]
    fn test_mass_flow_chain() {
        let report = service(DesignSettings::default()).design(&mass_flow_inputs()).unwrap();
        assert!((report.wall_friction.angle_deg - 20.0).abs() < 1e-9);

        let mass = report.mass_flow.as_ref().unwrap();
        assert_eq!(mass.chart_phi_e, 40);
        assert!((mass.boundary_angle_deg - 21.5).abs() < 1e-9);
        assert!((mass.hopper_angle_deg - 18.5).abs() < 1e-9);
        assert!((mass.flow_factor - 1.6770938154363406).abs() < 1e-6);

        let critical = mass.critical.unwrap();
        assert!((critical.sigma1_crit.value() - 2.1261352874484345).abs() < 1e-5);
        assert!((critical.sigma_c_crit.value() - 1.2677497632386556).abs() < 1e-5);
        assert!((mass.outlet_m.unwrap() - 0.1076919608595528).abs() < 1e-6);
        assert!((mass.geometry_factor - 2.266).abs() < 1e-9);
        assert!((mass.geometry_corrected_outlet_m.unwrap() - 0.12201499165387335).abs() < 1e-6);
        assert_eq!(report.governing_dimension_m, mass.geometry_corrected_outlet_m);

        assert!(report.funnel_flow.is_none());
        assert!(report.conditions.is_empty(), "{:?}", report.conditions);
    }

    #[test]
    fn test_secant_solver_gives_same_outlet() {
        let settings = DesignSettings {
            solver: SolverKind::Secant,
            ..DesignSettings::default()
        };
        let iterated = service(settings).design(&mass_flow_inputs()).unwrap();
        let exact = service(DesignSettings::default()).design(&mass_flow_inputs()).unwrap();
        let (a, b) = (
            iterated.mass_flow.unwrap().outlet_m.unwrap(),
            exact.mass_flow.unwrap().outlet_m.unwrap(),
        );
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_default_session_reads_charts_without_extrapolation() {
        let report = service(DesignSettings::default()).design(&DesignInputs::default()).unwrap();
        assert!((report.wall_friction.angle_deg - 22.933281368984094).abs() < 1e-9);

        let mass = report.mass_flow.as_ref().unwrap();
        assert_eq!(mass.chart_phi_e, 50);
        assert!((mass.boundary_angle_deg - 14.844707328769946).abs() < 1e-9);
        assert!((mass.flow_factor - 1.4803429113381241).abs() < 1e-9);
        assert!(!has(&report, |c| matches!(
            c,
            Condition::Extrapolated {
                family: ChartFamily::ConicalFlowFactor,
                ..
            }
        )));
        assert!(report.governing_dimension_m.unwrap() > 0.0);
    }

    #[test]
    fn test_manual_readings_are_reported() {
        let inputs = DesignInputs {
            manual_hopper_angle_deg: Some(20.0),
            manual_flow_factor: Some(1.5),
            ..mass_flow_inputs()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        let mass = report.mass_flow.as_ref().unwrap();
        assert_eq!(mass.hopper_angle_deg, 20.0);
        assert_eq!(mass.flow_factor, 1.5);
        let sigma1 = 0.8 / (1.0 / 1.5 - 0.22);
        assert!((mass.critical.unwrap().sigma1_crit.value() - sigma1).abs() < 1e-9);
        assert!(has(&report, |c| matches!(
            c,
            Condition::ManualChartReading {
                subject: Subject::FlowFactor,
                ..
            }
        )));
        assert!(has(&report, |c| matches!(
            c,
            Condition::ManualChartReading {
                subject: Subject::HopperAngle,
                ..
            }
        )));
    }

    #[test]
    fn test_steep_wall_limits_hopper_angle() {
        // φx beyond the φe 40 boundary's digitized end gives a negative boundary angle
        let tan = 38f64.to_radians().tan();
        let inputs = DesignInputs {
            wall_yield_locus: LineInput::points(&[[5.0, 5.0 * tan], [10.0, 10.0 * tan]]),
            ..mass_flow_inputs()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        assert_eq!(report.mass_flow.as_ref().unwrap().hopper_angle_deg, 0.0);
        assert!(has(&report, |c| matches!(c, Condition::HopperAngleLimited { .. })));
        assert!(has(&report, |c| matches!(
            c,
            Condition::Extrapolated {
                family: ChartFamily::ConicalBoundary,
                ..
            }
        )));
    }

    #[test]
    fn test_funnel_flow_bounds() {
        let inputs = DesignInputs {
            flow_pattern: FlowPattern::FunnelFlow,
            ..DesignInputs::default()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        let funnel = report.funnel_flow.as_ref().unwrap();

        assert!((funnel.clearance_angle_deg - 42.0667186310159).abs() < 1e-9);
        assert_eq!(funnel.phi_lin_deg, 50.0);
        assert!((funnel.f_phi_i - 5.05556).abs() < 1e-12);
        assert!((funnel.ratholing_flow_factor.value - 2.913781218914173).abs() < 1e-9);

        let lower = funnel.lower_bound.unwrap();
        assert!((lower.sigma1.value() - 6.683979738232533).abs() < 1e-6);
        assert!((lower.diameter_m - 0.49256914637330274).abs() < 1e-6);

        assert!((funnel.max_vertical_stress.value() - 77.39437939874126).abs() < 1e-6);
        assert!((funnel.upper_bound.diameter_m - 3.856005928291148).abs() < 1e-6);

        let arching = funnel.arching.unwrap();
        assert_eq!(arching.flow_factor, 1.7);
        assert!((arching.dimension_m - 0.11081961671073577).abs() < 1e-6);

        assert_eq!(report.governing_dimension_m, Some(funnel.upper_bound.diameter_m));
        assert!(has(&report, |c| matches!(c, Condition::LinearizedFrictionApproximation { .. })));
        assert!(has(&report, |c| matches!(c, Condition::RatholeExceedsSilo { .. })));
        assert!(!has(&report, |c| matches!(c, Condition::SimplifiedSiloGeometry)));
        assert!(has(&report, |c| matches!(
            c,
            Condition::ConicalArchingEstimate { dimension_m } if *dimension_m == arching.dimension_m
        )));
    }

    #[test]
    fn test_slot_funnel_flow_uses_plane_doming_geometry() {
        let inputs = DesignInputs {
            flow_pattern: FlowPattern::FunnelFlow,
            hopper_shape: HopperShape::Slot,
            ..DesignInputs::default()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        let arching = report.funnel_flow.as_ref().unwrap().arching.unwrap();
        assert_eq!(arching.geometry_factor, 1.15);
        assert!((arching.dimension_m - 0.06372127960867308).abs() < 1e-6);
        assert!(has(&report, |c| matches!(c, Condition::SimplifiedSiloGeometry)));
        assert!(!has(&report, |c| matches!(c, Condition::ConicalArchingEstimate { .. })));
    }

    #[test]
    fn test_low_friction_ratholing_coefficient_below_zero_is_rejected() {
        // f(φi) read below the chart at φe = 5° extrapolates to about -0.39
        let inputs = DesignInputs {
            flow_pattern: FlowPattern::FunnelFlow,
            effective_friction_deg: 5.0,
            ..DesignInputs::default()
        };
        let err = service(DesignSettings::default()).design(&inputs).unwrap_err();
        match err {
            DesignError::InvalidInput { field, value, .. } => {
                assert_eq!(field, "f_phi_i");
                assert!(value < 0.0);
            }
            other => panic!("expected invalid f(phi_i), got {other:?}"),
        }
    }

    #[test]
    fn test_low_friction_floors_ratholing_flow_factor() {
        let inputs = DesignInputs {
            flow_pattern: FlowPattern::FunnelFlow,
            effective_friction_deg: 25.0,
            ..DesignInputs::default()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        let ffp = report.funnel_flow.as_ref().unwrap().ratholing_flow_factor;
        assert!(ffp.floored);
        assert!(ffp.computed < 1.7);
        assert_eq!(ffp.value, 1.7);
        assert!(has(&report, |c| matches!(c, Condition::FlowFactorFloored { .. })));
        // f(φi) below 30° lies off the digitized chart
        assert!(has(&report, |c| matches!(
            c,
            Condition::Extrapolated {
                family: ChartFamily::RatholingCoefficient,
                ..
            }
        )));
    }

    #[test]
    fn test_sparse_wall_data() {
        let inputs = DesignInputs {
            wall_yield_locus: LineInput::points(&[[0.0, 1.0], [8.0, 3.0]]),
            ..mass_flow_inputs()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        assert_eq!(report.wall_friction.angle_deg, 0.0);
        assert!(has(&report, |c| matches!(
            c,
            Condition::InsufficientData {
                subject: Subject::WallYieldLocus,
                points: 1
            }
        )));
    }

    #[test]
    fn test_wall_friction_from_equation() {
        let inputs = DesignInputs {
            wall_yield_locus: LineInput::Equation {
                slope: 0.35,
                intercept: 0.3,
            },
            ..mass_flow_inputs()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        assert!((report.wall_friction.angle_deg - 20.80679101271123).abs() < 1e-9);
    }

    #[test]
    fn test_equation_wall_locus_without_reference_stress() {
        let settings = DesignSettings {
            reference_wall_stress_kpa: 0.0,
            ..DesignSettings::default()
        };
        let inputs = DesignInputs {
            wall_yield_locus: LineInput::Equation {
                slope: 0.35,
                intercept: 0.3,
            },
            ..mass_flow_inputs()
        };
        let report = service(settings).design(&inputs).unwrap();
        assert_eq!(report.wall_friction.angle_deg, 0.0);
        assert!(has(&report, |c| matches!(
            c,
            Condition::InsufficientData {
                subject: Subject::WallYieldLocus,
                points: 0
            }
        )));
        assert!(report.governing_dimension_m.is_some_and(f64::is_finite));
    }

    #[test]
    fn test_manual_vertical_hopper_wall() {
        let inputs = DesignInputs {
            manual_hopper_angle_deg: Some(0.0),
            ..mass_flow_inputs()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        let mass = report.mass_flow.as_ref().unwrap();
        assert_eq!(mass.hopper_angle_deg, 0.0);
        assert!((mass.geometry_factor - 2.0).abs() < 1e-12);
        assert!(has(&report, |c| matches!(
            c,
            Condition::ManualChartReading {
                subject: Subject::HopperAngle,
                value
            } if *value == 0.0
        )));

        let inputs = DesignInputs {
            manual_hopper_angle_deg: Some(-1.0),
            ..mass_flow_inputs()
        };
        assert!(service(DesignSettings::default()).design(&inputs).is_err());
    }

    #[test]
    fn test_parallel_flow_function_leaves_outlet_absent() {
        let inputs = DesignInputs {
            manual_flow_factor: Some(2.0),
            time_flow_function: LineInput::Equation {
                slope: 0.5,
                intercept: 0.8,
            },
            ..mass_flow_inputs()
        };
        let report = service(DesignSettings::default()).design(&inputs).unwrap();
        let mass = report.mass_flow.as_ref().unwrap();
        assert!(mass.critical.is_none());
        assert!(mass.outlet_m.is_none());
        assert_eq!(report.governing_dimension_m, None);
        assert!(has(&report, |c| matches!(
            c,
            Condition::NoIntersection {
                subject: Subject::MassFlowArching,
                ..
            }
        )));
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let service = service(DesignSettings::default());
        let err = service
            .design(&DesignInputs {
                bulk_density: 0.0,
                ..DesignInputs::default()
            })
            .unwrap_err();
        assert!(matches!(err, DesignError::InvalidInput { field: "bulk_density", .. }));

        for phi_e in [0.0, 90.0, f64::NAN] {
            let inputs = DesignInputs {
                effective_friction_deg: phi_e,
                ..DesignInputs::default()
            };
            assert!(service.design(&inputs).is_err());
        }

        let inputs = DesignInputs {
            flow_pattern: FlowPattern::FunnelFlow,
            silo_diameter_m: 0.0,
            ..DesignInputs::default()
        };
        assert!(matches!(
            service.design(&inputs),
            Err(DesignError::InvalidInput { field: "silo_diameter_m", .. })
        ));
    }
}
