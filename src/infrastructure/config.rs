// Configuration loading - analysis thresholds, charts and server settings
use crate::domain::balance::BalanceConfig;
use crate::domain::jump::JumpPhaseConfig;
use crate::domain::smoothing::SmoothingConfig;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub detector: JumpPhaseConfig,
    #[serde(default)]
    pub balance: BalanceConfig,
    #[serde(default)]
    pub charts: ChartSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub default_joint: String,
    pub max_points: usize,
    /// Keypoints whose speed is charted and reported live.
    pub speed_keypoints: Vec<String>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            default_joint: "left_knee".to_string(),
            max_points: 150,
            speed_keypoints: vec!["left_hip".to_string(), "right_hip".to_string()],
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.detector.validate().context("invalid [detector] settings")?;
        self.balance.validate().context("invalid [balance] settings")?;
        if self.charts.max_points == 0 {
            anyhow::bail!("charts.max_points must be positive");
        }
        Ok(())
    }
}

/// Load `config/analysis.*` (optional) overlaid with `MOTION__SECTION__KEY`
/// environment variables.
pub fn load_config() -> anyhow::Result<AppConfig> {
    load_config_from("config/analysis")
}

pub fn load_config_from(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("MOTION")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("failed to read configuration from {}", path))?;

    let app_config: AppConfig = settings
        .try_deserialize()
        .context("failed to deserialize configuration")?;
    app_config.validate()?;
    Ok(app_config)
}
