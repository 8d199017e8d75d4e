// Errors that stop a design calculation
use super::chart::ChartFamily;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DesignError {
    #[error("invalid input: {field} must be {requirement} (got {value})")]
    InvalidInput {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },

    #[error("no usable {family} chart digitized for phi_e = {phi_e:?}")]
    MissingChart {
        family: ChartFamily,
        phi_e: Option<u16>,
    },
}

impl DesignError {
    pub fn invalid(field: &'static str, requirement: &'static str, value: f64) -> Self {
        DesignError::InvalidInput {
            field,
            requirement,
            value,
        }
    }
}
