// Application configuration - file and environment layers over built-in defaults
use anyhow::bail;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/hopper.toml";
const ENV_PREFIX: &str = "HOPPER";

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub design: DesignSettings,
    pub charts: ChartSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Which intersection solver the design service uses
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    ClosedForm,
    Secant,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DesignSettings {
    /// m/s²
    pub gravity: f64,
    /// Degrees subtracted from the mass-flow boundary angle
    pub safety_margin_deg: f64,
    /// Lowest ratholing flow factor used for sizing
    pub ratholing_floor: f64,
    /// Flow factor for the funnel-flow arching check
    pub doming_flow_factor: f64,
    /// H used for slot outlets in the funnel-flow arching check
    pub slot_doming_geometry: f64,
    /// Funnel-flow clearance angle is this minus φx
    pub clearance_limit_deg: f64,
    /// Wall normal stress at which an equation wall yield locus is evaluated, kPa
    pub reference_wall_stress_kpa: f64,
    pub solver: SolverKind,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            safety_margin_deg: 3.0,
            ratholing_floor: 1.7,
            doming_flow_factor: 1.7,
            slot_doming_geometry: 1.15,
            clearance_limit_deg: 65.0,
            reference_wall_stress_kpa: 10.0,
            solver: SolverKind::ClosedForm,
        }
    }
}

impl DesignSettings {
    /// Reject settings that would divide by zero or size with a non-positive factor
    pub fn validate(&self) -> anyhow::Result<()> {
        let positive = [
            ("gravity", self.gravity),
            ("reference_wall_stress_kpa", self.reference_wall_stress_kpa),
            ("ratholing_floor", self.ratholing_floor),
            ("doming_flow_factor", self.doming_flow_factor),
            ("slot_doming_geometry", self.slot_doming_geometry),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                bail!("design.{key} must be finite and positive (got {value})");
            }
        }
        if !self.safety_margin_deg.is_finite() || !self.clearance_limit_deg.is_finite() {
            bail!("design angles must be finite");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ChartSettings {
    /// Chart dataset to load instead of the bundled one
    pub path: Option<String>,
}

/// Load configuration from `path` (optional) and `HOPPER__SECTION__KEY` variables.
pub fn load_config(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.design.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = load_config("config/no-such-file").unwrap();
        assert_eq!(config.design, DesignSettings::default());
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.charts.path, None);
    }

    #[test]
    fn test_file_overrides_some_keys() {
        let path = std::env::temp_dir().join(format!("hopper-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[design]\nsafety_margin_deg = 5.0\nsolver = \"secant\"\n\n[charts]\npath = \"data/other.toml\"\n",
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.design.safety_margin_deg, 5.0);
        assert_eq!(config.design.solver, SolverKind::Secant);
        assert_eq!(config.design.gravity, 9.81);
        assert_eq!(config.charts.path.as_deref(), Some("data/other.toml"));
    }

    #[test]
    fn test_zero_reference_wall_stress_is_rejected() {
        let path = std::env::temp_dir().join(format!("hopper-config-zero-{}.toml", std::process::id()));
        std::fs::write(&path, "[design]\nreference_wall_stress_kpa = 0.0\n").unwrap();

        let err = load_config(path.to_str().unwrap()).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(err.to_string().contains("reference_wall_stress_kpa"), "{err}");
    }

    #[test]
    fn test_settings_validation() {
        assert!(DesignSettings::default().validate().is_ok());
        let settings = DesignSettings {
            gravity: 0.0,
            ..DesignSettings::default()
        };
        assert!(settings.validate().is_err());
        let settings = DesignSettings {
            doming_flow_factor: f64::NAN,
            ..DesignSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
