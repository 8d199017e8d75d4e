// Domain layer - chart data, fits, design inputs and results
pub mod chart;
pub mod condition;
pub mod design;
pub mod error;
pub mod linear_fit;
pub mod units;
