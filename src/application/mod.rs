// Application layer - chart lookups, formulas and the design use case
pub mod chart_interpolator;
pub mod chart_source;
pub mod design_service;
pub mod formulas;
pub mod intersection;
