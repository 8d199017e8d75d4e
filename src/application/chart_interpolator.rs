// Chart interpolator - continuous lookups over digitized chart families
use std::sync::Arc;

use crate::application::chart_source::ChartSource;
use crate::domain::chart::{ChartCurve, ChartFamily};
use crate::domain::condition::Condition;
use crate::domain::design::HopperShape;
use crate::domain::error::DesignError;

/// Spacing of the φe values the mass-flow charts were drawn for
pub const PHI_E_STEP_DEG: f64 = 5.0;

/// A looked-up value and the condition it was obtained under, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    pub value: T,
    pub condition: Option<Condition>,
}

impl<T> Reading<T> {
    fn exact(value: T) -> Self {
        Self {
            value,
            condition: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    /// Line of constant x; positions are measured along y
    Vertical,
    /// Line of constant y; positions are measured along x
    Horizontal,
}

impl Axis {
    /// (coordinate fixed by the line, coordinate along the line)
    fn split(self, p: (f64, f64)) -> (f64, f64) {
        match self {
            Axis::Vertical => p,
            Axis::Horizontal => (p.1, p.0),
        }
    }
}

struct Contour {
    level: f64,
    polyline: Vec<(f64, f64)>,
}

#[derive(Clone)]
pub struct ChartInterpolator {
    source: Arc<dyn ChartSource>,
}

impl ChartInterpolator {
    pub fn new(source: Arc<dyn ChartSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn ChartSource> {
        &self.source
    }

    /// Round φe to the nearest chart step, then clamp to the charts that exist.
    ///
    /// Clamping is reported; plain rounding is not.
    pub fn snap_phi_e(&self, family: ChartFamily, phi_e_deg: f64) -> Result<Reading<u16>, DesignError> {
        let available = self.source.phi_e_values(family);
        let (Some(&lo), Some(&hi)) = (available.first(), available.last()) else {
            return Err(DesignError::MissingChart { family, phi_e: None });
        };

        let rounded = (phi_e_deg / PHI_E_STEP_DEG).round() * PHI_E_STEP_DEG;
        let clamped = rounded.clamp(f64::from(lo), f64::from(hi));
        let chart = available
            .iter()
            .copied()
            .min_by(|a, b| {
                (f64::from(*a) - clamped)
                    .abs()
                    .total_cmp(&(f64::from(*b) - clamped).abs())
            })
            .unwrap_or(lo);

        let condition = (f64::from(chart) != rounded).then_some(Condition::ChartClamped {
            family,
            requested_deg: phi_e_deg,
            used_deg: chart,
        });
        tracing::debug!("phi_e {:.1} -> {} chart {}", phi_e_deg, family, chart);
        Ok(Reading {
            value: chart,
            condition,
        })
    }

    /// Hopper inclination on the mass-flow boundary at the given wall friction angle
    pub fn boundary_angle(
        &self,
        shape: HopperShape,
        phi_e: u16,
        wall_friction_deg: f64,
    ) -> Result<Reading<f64>, DesignError> {
        let family = ChartFamily::boundary(shape);
        let curve = self.main_curve(family, Some(phi_e))?;
        // Charts plot Θ on x and φx on y; read Θ as a function of φx
        let mut table: Vec<(f64, f64)> = curve.points.iter().map(|&(theta, phi_x)| (phi_x, theta)).collect();
        Ok(interpolate_table(family, &mut table, wall_friction_deg))
    }

    /// Flow factor at a design point, from the iso-flow-factor contours bracketing it
    pub fn flow_factor(
        &self,
        shape: HopperShape,
        phi_e: u16,
        hopper_angle_deg: f64,
        wall_friction_deg: f64,
    ) -> Result<Reading<f64>, DesignError> {
        let family = ChartFamily::flow_factor(shape);
        let missing = DesignError::MissingChart {
            family,
            phi_e: Some(phi_e),
        };
        let curves = self.source.curves(family, Some(phi_e)).ok_or(missing.clone())?;
        let contours: Vec<Contour> = curves
            .iter()
            .filter(|c| c.points.len() >= 2)
            .filter_map(|c| {
                Some(Contour {
                    level: c.level()?,
                    polyline: polyline(c),
                })
            })
            .collect();
        if contours.is_empty() {
            return Err(missing);
        }

        let reading = bracket(family, &contours, Axis::Vertical, hopper_angle_deg, wall_friction_deg)
            .or_else(|| bracket(family, &contours, Axis::Horizontal, wall_friction_deg, hopper_angle_deg))
            .unwrap_or_else(|| nearest_level(family, &contours, hopper_angle_deg, wall_friction_deg));
        tracing::debug!(
            "flow factor at theta={:.2}, phi_x={:.2} on {} phi_e={}: {:.3}",
            hopper_angle_deg,
            wall_friction_deg,
            family,
            phi_e,
            reading.value
        );
        Ok(reading)
    }

    /// f(φi), the ratholing coefficient
    pub fn ratholing_coefficient(&self, phi_i_deg: f64) -> Result<Reading<f64>, DesignError> {
        self.coefficient(ChartFamily::RatholingCoefficient, phi_i_deg)
    }

    /// H(Θ), the outlet geometry coefficient
    pub fn geometry_coefficient(&self, shape: HopperShape, hopper_angle_deg: f64) -> Result<Reading<f64>, DesignError> {
        self.coefficient(ChartFamily::geometry(shape), hopper_angle_deg)
    }

    fn coefficient(&self, family: ChartFamily, x: f64) -> Result<Reading<f64>, DesignError> {
        let curve = self.main_curve(family, None)?;
        let mut table = curve.points.clone();
        Ok(interpolate_table(family, &mut table, x))
    }

    fn main_curve(&self, family: ChartFamily, phi_e: Option<u16>) -> Result<&ChartCurve, DesignError> {
        self.source
            .curves(family, phi_e)
            .and_then(|curves| curves.iter().find(|c| !c.points.is_empty()))
            .ok_or(DesignError::MissingChart { family, phi_e })
    }
}

/// Polyline to walk for a curve: loops are closed, open curves sorted along x
fn polyline(curve: &ChartCurve) -> Vec<(f64, f64)> {
    let mut points = curve.points.clone();
    if curve.is_closed_loop() {
        points.push(points[0]);
    } else {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    points
}

/// 1-D linear interpolation, extrapolating from the two end points outside the table
fn interpolate_table(family: ChartFamily, table: &mut [(f64, f64)], x: f64) -> Reading<f64> {
    table.sort_by(|a, b| a.0.total_cmp(&b.0));
    let n = table.len();
    let (min, max) = (table[0].0, table[n - 1].0);
    let condition = (x < min || x > max).then_some(Condition::Extrapolated {
        family,
        input: x,
        min,
        max,
    });
    if n == 1 {
        return Reading {
            value: table[0].1,
            condition,
        };
    }

    let (a, b) = if x < min {
        (table[0], table[1])
    } else if x > max {
        (table[n - 2], table[n - 1])
    } else {
        let i = table.partition_point(|p| p.0 <= x).clamp(1, n - 1);
        (table[i - 1], table[i])
    };
    Reading {
        value: lerp(a, b, x),
        condition,
    }
}

fn lerp(a: (f64, f64), b: (f64, f64), x: f64) -> f64 {
    if (b.0 - a.0).abs() < f64::EPSILON {
        a.1
    } else {
        a.1 + (b.1 - a.1) * (x - a.0) / (b.0 - a.0)
    }
}

/// Positions along a line where the polyline crosses it
fn crossings(polyline: &[(f64, f64)], axis: Axis, line: f64) -> Vec<f64> {
    polyline
        .windows(2)
        .filter_map(|w| {
            let (a, b) = (axis.split(w[0]), axis.split(w[1]));
            if (a.0 - line) * (b.0 - line) > 0.0 || (b.0 - a.0).abs() < f64::EPSILON {
                return None;
            }
            Some(a.1 + (b.1 - a.1) * (line - a.0) / (b.0 - a.0))
        })
        .collect()
}

/// Interpolate between the nearest contour crossings on either side of `position`.
/// `None` when no contour meets the line at all.
fn bracket(family: ChartFamily, contours: &[Contour], axis: Axis, line: f64, position: f64) -> Option<Reading<f64>> {
    let hits: Vec<(f64, f64)> = contours
        .iter()
        .flat_map(|c| {
            crossings(&c.polyline, axis, line)
                .into_iter()
                .map(move |at| (at, c.level))
        })
        .collect();

    let below = hits
        .iter()
        .filter(|h| h.0 <= position)
        .max_by(|a, b| a.0.total_cmp(&b.0));
    let above = hits
        .iter()
        .filter(|h| h.0 >= position)
        .min_by(|a, b| a.0.total_cmp(&b.0));

    match (below, above) {
        (Some(&lo), Some(&hi)) => {
            let value = if (hi.0 - lo.0).abs() < f64::EPSILON || lo.1 == hi.1 {
                lo.1
            } else {
                lo.1 + (hi.1 - lo.1) * (position - lo.0) / (hi.0 - lo.0)
            };
            Some(Reading::exact(value))
        }
        (Some(&only), None) | (None, Some(&only)) => {
            let (min, max) = hits
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), h| (lo.min(h.0), hi.max(h.0)));
            Some(Reading {
                value: only.1,
                condition: Some(Condition::Extrapolated {
                    family,
                    input: position,
                    min,
                    max,
                }),
            })
        }
        (None, None) => None,
    }
}

/// Level of the digitized vertex closest to the design point
fn nearest_level(family: ChartFamily, contours: &[Contour], x: f64, y: f64) -> Reading<f64> {
    let mut best = (f64::INFINITY, contours[0].level);
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for contour in contours {
        for p in &contour.polyline {
            let d = (p.0 - x).hypot(p.1 - y);
            if d < best.0 {
                best = (d, contour.level);
            }
            min = min.min(p.1);
            max = max.max(p.1);
        }
    }
    Reading {
        value: best.1,
        condition: Some(Condition::Extrapolated {
            family,
            input: y,
            min,
            max,
        }),
    }
}
