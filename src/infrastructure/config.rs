use crate::application::history_store::{DEFAULT_CAPACITY, DEFAULT_STORAGE_KEY};
use crate::domain::equipment::Measurement;
use crate::domain::filter::FilterSpec;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub simulation: SimulationConfig,
    pub filter: FilterDefaults,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one file per storage key; in-memory when unset.
    pub dir: Option<PathBuf>,
    pub key: String,
    pub capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            key: DEFAULT_STORAGE_KEY.to_string(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the dataset API, e.g. `http://localhost:8000/api`. Offline when unset.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_ms: u64,
    pub flow_step: f64,
    pub pressure_step: f64,
    pub temperature_step: f64,
    /// Overshoot past the threshold beyond which an alarm is critical.
    pub critical_margin: f64,
    pub alarm_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            flow_step: 10.0,
            pressure_step: 2.0,
            temperature_step: 1.0,
            critical_margin: 10.0,
            alarm_capacity: 10,
        }
    }
}

impl SimulationConfig {
    pub fn max_step(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Flowrate => self.flow_step,
            Measurement::Pressure => self.pressure_step,
            Measurement::Temperature => self.temperature_step,
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Filter bounds a new session starts from.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterDefaults {
    pub min_flow: f64,
    pub max_flow: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    pub pressure_threshold: f64,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        let spec = FilterSpec::default();
        Self {
            min_flow: spec.min_flow,
            max_flow: spec.max_flow,
            min_pressure: spec.min_pressure,
            max_pressure: spec.max_pressure,
            pressure_threshold: spec.pressure_threshold,
        }
    }
}

impl FilterDefaults {
    pub fn to_spec(&self) -> FilterSpec {
        FilterSpec {
            min_flow: self.min_flow,
            max_flow: self.max_flow,
            min_pressure: self.min_pressure,
            max_pressure: self.max_pressure,
            pressure_threshold: self.pressure_threshold,
            ..FilterSpec::default()
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let sim = &self.simulation;
        if sim.tick_ms == 0 {
            anyhow::bail!("simulation.tick_ms must be positive");
        }
        for measurement in Measurement::ALL {
            let step = sim.max_step(measurement);
            if !step.is_finite() || step < 0.0 {
                anyhow::bail!(
                    "simulation step for {} must be a non-negative number, got {}",
                    measurement.label(),
                    step
                );
            }
        }
        if self.storage.capacity == 0 {
            anyhow::bail!("storage.capacity must be at least 1");
        }
        Ok(())
    }
}

/// Load `config/equipment-telemetry.{toml,yaml,json}` if present, then `EQT_*` env overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/equipment-telemetry").required(false))
        .add_source(
            config::Environment::with_prefix("EQT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
