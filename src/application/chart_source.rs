// Read access to digitized chart data
use crate::domain::chart::{ChartCurve, ChartFamily, ChartSummary};

/// Source of digitized chart curves. Implementations are loaded once and never mutated.
pub trait ChartSource: Send + Sync {
    /// Curves of one chart slice, or `None` when that chart was never digitized
    fn curves(&self, family: ChartFamily, phi_e: Option<u16>) -> Option<&[ChartCurve]>;

    /// Discrete φe values available for a family, ascending
    fn phi_e_values(&self, family: ChartFamily) -> Vec<u16>;

    /// Overview of every family in the source
    fn summary(&self) -> Vec<ChartSummary>;
}
