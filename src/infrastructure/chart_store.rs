// Chart dataset loaded from TOML - bundled at build time or read from disk
use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::application::chart_source::ChartSource;
use crate::domain::chart::{ChartCurve, ChartDataset, ChartFamily, ChartPoint, ChartSummary, CurveId};

const BUNDLED_CHARTS: &str = include_str!("../../data/charts.toml");

#[derive(Debug, Deserialize)]
struct ChartFile {
    curves: Vec<CurveRecord>,
}

#[derive(Debug, Deserialize)]
struct CurveRecord {
    family: ChartFamily,
    phi_e: Option<u16>,
    level: Option<f64>,
    points: Vec<[f64; 2]>,
}

impl CurveRecord {
    fn validate(&self, index: usize) -> anyhow::Result<()> {
        let family = self.family;
        if self.points.is_empty() {
            bail!("curve {index} ({family}) has no points");
        }
        if self.points.iter().flatten().any(|v| !v.is_finite()) {
            bail!("curve {index} ({family}) has a non-finite coordinate");
        }
        if family.is_per_phi_e() != self.phi_e.is_some() {
            bail!("curve {index} ({family}): phi_e must be given exactly for per-phi_e charts");
        }
        match self.level {
            Some(level) if !family.is_contour() => {
                bail!("curve {index} ({family}) is not a contour chart but has level {level}")
            }
            Some(level) if !(level.is_finite() && level > 0.0) => {
                bail!("curve {index} ({family}) has invalid level {level}")
            }
            None if family.is_contour() => bail!("contour curve {index} ({family}) has no level"),
            _ => Ok(()),
        }
    }

    fn into_points(self) -> impl Iterator<Item = ChartPoint> {
        let curve = self.level.map_or(CurveId::Main, CurveId::contour);
        let (family, phi_e) = (self.family, self.phi_e);
        self.points.into_iter().map(move |[x, y]| ChartPoint {
            family,
            phi_e,
            x,
            y,
            curve,
        })
    }
}

/// Parse a chart dataset from TOML text
pub fn parse_charts(text: &str) -> anyhow::Result<ChartDataset> {
    let file: ChartFile = toml::from_str(text).context("Failed to parse chart dataset")?;
    for (index, record) in file.curves.iter().enumerate() {
        record.validate(index)?;
    }
    let dataset = ChartDataset::from_points(file.curves.into_iter().flat_map(CurveRecord::into_points));
    if dataset.is_empty() {
        bail!("chart dataset has no curves");
    }
    Ok(dataset)
}

/// The dataset compiled into the binary
pub fn bundled_charts() -> anyhow::Result<ChartDataset> {
    parse_charts(BUNDLED_CHARTS).context("Bundled chart dataset is invalid")
}

/// Load charts from `path`, or the bundled dataset when no path is configured
pub fn load_charts(path: Option<&Path>) -> anyhow::Result<ChartDataset> {
    let dataset = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read chart dataset {}", path.display()))?;
            parse_charts(&text).with_context(|| format!("Invalid chart dataset {}", path.display()))?
        }
        None => bundled_charts()?,
    };

    for summary in dataset.summary() {
        tracing::info!(
            "Loaded {} chart: {} curves, {} points, phi_e {:?}",
            summary.family,
            summary.curves,
            summary.points,
            summary.phi_e
        );
    }
    Ok(dataset)
}

impl ChartSource for ChartDataset {
    fn curves(&self, family: ChartFamily, phi_e: Option<u16>) -> Option<&[ChartCurve]> {
        ChartDataset::curves(self, family, phi_e)
    }

    fn phi_e_values(&self, family: ChartFamily) -> Vec<u16> {
        ChartDataset::phi_e_values(self, family)
    }

    fn summary(&self) -> Vec<ChartSummary> {
        ChartDataset::summary(self)
    }
}
