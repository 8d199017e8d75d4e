// Digitized design-chart domain models
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::design::HopperShape;

// A curve whose end lies within this many mean segment lengths of its start is a closed loop
const LOOP_GAP_SEGMENTS: f64 = 2.0;
const LOOP_MIN_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartFamily {
    ConicalBoundary,
    PlaneBoundary,
    ConicalFlowFactor,
    PlaneFlowFactor,
    RatholingCoefficient,
    ConicalGeometry,
    PlaneGeometry,
}

impl ChartFamily {
    pub const ALL: [ChartFamily; 7] = [
        ChartFamily::ConicalBoundary,
        ChartFamily::PlaneBoundary,
        ChartFamily::ConicalFlowFactor,
        ChartFamily::PlaneFlowFactor,
        ChartFamily::RatholingCoefficient,
        ChartFamily::ConicalGeometry,
        ChartFamily::PlaneGeometry,
    ];

    pub fn boundary(shape: HopperShape) -> Self {
        match shape {
            HopperShape::Conical => ChartFamily::ConicalBoundary,
            HopperShape::Slot => ChartFamily::PlaneBoundary,
        }
    }

    pub fn flow_factor(shape: HopperShape) -> Self {
        match shape {
            HopperShape::Conical => ChartFamily::ConicalFlowFactor,
            HopperShape::Slot => ChartFamily::PlaneFlowFactor,
        }
    }

    pub fn geometry(shape: HopperShape) -> Self {
        match shape {
            HopperShape::Conical => ChartFamily::ConicalGeometry,
            HopperShape::Slot => ChartFamily::PlaneGeometry,
        }
    }

    /// Families whose curves are iso-lines of a flow-factor level
    pub fn is_contour(self) -> bool {
        matches!(self, ChartFamily::ConicalFlowFactor | ChartFamily::PlaneFlowFactor)
    }

    /// Families drawn once per effective angle of internal friction
    pub fn is_per_phi_e(self) -> bool {
        matches!(
            self,
            ChartFamily::ConicalBoundary
                | ChartFamily::PlaneBoundary
                | ChartFamily::ConicalFlowFactor
                | ChartFamily::PlaneFlowFactor
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartFamily::ConicalBoundary => "conical_boundary",
            ChartFamily::PlaneBoundary => "plane_boundary",
            ChartFamily::ConicalFlowFactor => "conical_flow_factor",
            ChartFamily::PlaneFlowFactor => "plane_flow_factor",
            ChartFamily::RatholingCoefficient => "ratholing_coefficient",
            ChartFamily::ConicalGeometry => "conical_geometry",
            ChartFamily::PlaneGeometry => "plane_geometry",
        }
    }
}

impl fmt::Display for ChartFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which iso-line of a chart slice a point belongs to.
///
/// Contour levels are kept in hundredths so they can be ordered and compared exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurveId {
    Main,
    Contour(u32),
}

impl CurveId {
    pub fn contour(level: f64) -> Self {
        CurveId::Contour((level * 100.0).round() as u32)
    }

    pub fn level(self) -> Option<f64> {
        match self {
            CurveId::Main => None,
            CurveId::Contour(hundredths) => Some(hundredths as f64 / 100.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub family: ChartFamily,
    pub phi_e: Option<u16>,
    pub x: f64,
    pub y: f64,
    pub curve: CurveId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SliceKey {
    pub family: ChartFamily,
    pub phi_e: Option<u16>,
}

/// One digitized curve, points in the order they were digitized.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartCurve {
    pub id: CurveId,
    pub points: Vec<(f64, f64)>,
}

impl ChartCurve {
    pub fn level(&self) -> Option<f64> {
        self.id.level()
    }

    /// True when the digitized curve returns to where it started.
    ///
    /// Loops are stored without repeating the first point, so the closing gap
    /// is about one segment long, while an open curve's ends are far apart.
    pub fn is_closed_loop(&self) -> bool {
        let n = self.points.len();
        if n < LOOP_MIN_POINTS {
            return false;
        }
        let total: f64 = self
            .points
            .windows(2)
            .map(|w| distance(w[0], w[1]))
            .sum();
        let mean_segment = total / (n - 1) as f64;
        distance(self.points[0], self.points[n - 1]) <= LOOP_GAP_SEGMENTS * mean_segment
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSummary {
    pub family: ChartFamily,
    pub phi_e: Vec<u16>,
    pub curves: usize,
    pub points: usize,
}

/// Immutable, process-wide collection of digitized chart curves.
#[derive(Debug, Clone, Default)]
pub struct ChartDataset {
    slices: BTreeMap<SliceKey, Vec<ChartCurve>>,
}

impl ChartDataset {
    /// Group points by `(family, phi_e)` and then by curve, keeping point order.
    pub fn from_points(points: impl IntoIterator<Item = ChartPoint>) -> Self {
        let mut grouped: BTreeMap<SliceKey, BTreeMap<CurveId, Vec<(f64, f64)>>> = BTreeMap::new();
        for p in points {
            let key = SliceKey {
                family: p.family,
                phi_e: p.phi_e,
            };
            grouped
                .entry(key)
                .or_default()
                .entry(p.curve)
                .or_default()
                .push((p.x, p.y));
        }

        let slices = grouped
            .into_iter()
            .map(|(key, curves)| {
                let curves = curves
                    .into_iter()
                    .map(|(id, points)| ChartCurve { id, points })
                    .collect();
                (key, curves)
            })
            .collect();
        Self { slices }
    }

    pub fn curves(&self, family: ChartFamily, phi_e: Option<u16>) -> Option<&[ChartCurve]> {
        self.slices
            .get(&SliceKey { family, phi_e })
            .map(|curves| curves.as_slice())
    }

    /// Discrete φe values digitized for a family, ascending
    pub fn phi_e_values(&self, family: ChartFamily) -> Vec<u16> {
        self.slices
            .keys()
            .filter(|k| k.family == family)
            .filter_map(|k| k.phi_e)
            .collect()
    }

    pub fn summary(&self) -> Vec<ChartSummary> {
        ChartFamily::ALL
            .iter()
            .filter_map(|&family| {
                let slices: Vec<&Vec<ChartCurve>> = self
                    .slices
                    .iter()
                    .filter(|(k, _)| k.family == family)
                    .map(|(_, curves)| curves)
                    .collect();
                if slices.is_empty() {
                    return None;
                }
                Some(ChartSummary {
                    family,
                    phi_e: self.phi_e_values(family),
                    curves: slices.iter().map(|c| c.len()).sum(),
                    points: slices
                        .iter()
                        .flat_map(|c| c.iter())
                        .map(|c| c.points.len())
                        .sum(),
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
