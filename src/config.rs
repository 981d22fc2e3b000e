use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analyzer::Granularity;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub db_path: String,
    pub title: String,
    pub theme: ThemeConfig,
    pub palette: Vec<String>,
    pub gauge: GaugeConfig,
    pub time_frame: Granularity,
    pub no_data_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeConfig {
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub font_color: String,
    pub font_family: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GaugeConfig {
    pub min: f64,
    pub max: f64,
    pub steps: Vec<GaugeStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeStep {
    pub from: f64,
    pub to: f64,
    pub color: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "HBOMax_Content.db".into(),
            title: "HBO MAX Asian Market Expansion Dashboard".into(),
            theme: ThemeConfig::default(),
            palette: [
                "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692",
                "#B6E880", "#FF97FF", "#FECB52",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            gauge: GaugeConfig::default(),
            time_frame: Granularity::Month,
            no_data_label: "No data".into(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            paper_bgcolor: "#2c2c2c".into(),
            plot_bgcolor: "#2c2c2c".into(),
            font_color: "white".into(),
            font_family: "Arial, sans-serif".into(),
        }
    }
}

impl Default for GaugeConfig {
    fn default() -> Self {
        let step = |from: f64, to: f64, color: &str| GaugeStep {
            from,
            to,
            color: color.to_string(),
        };
        Self {
            min: 0.0,
            max: 100.0,
            steps: vec![
                step(0.0, 20.0, "green"),
                step(20.0, 40.0, "yellow"),
                step(40.0, 60.0, "orange"),
                step(60.0, 100.0, "red"),
            ],
        }
    }
}

/// Reads the JSON config file if one is given; keys absent from the file
/// keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, AppError> {
    match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)?;
            let config = serde_json::from_str(&raw)?;
            log::info!("Configuration loaded from {}", p.display());
            Ok(config)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Splits a `key=value` override.
pub fn parse_override(raw: &str) -> Result<(String, String), AppError> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| AppError::Custom(format!("Expected key=value, got '{}'", raw)))
}

/// Applies one override by key. Unparsable values keep the current setting;
/// unknown keys are ignored. Returns whether the key was recognised.
pub fn apply_override(config: &mut AppConfig, key: &str, value: &str) -> bool {
    match key {
        "dbPath" => config.db_path = value.to_string(),
        "title" => config.title = value.to_string(),
        "noDataLabel" => config.no_data_label = value.to_string(),
        "timeFrame" => config.time_frame = value.parse().unwrap_or(config.time_frame),
        "theme.paperBgcolor" => config.theme.paper_bgcolor = value.to_string(),
        "theme.plotBgcolor" => config.theme.plot_bgcolor = value.to_string(),
        "theme.fontColor" => config.theme.font_color = value.to_string(),
        "theme.fontFamily" => config.theme.font_family = value.to_string(),
        "gauge.min" => config.gauge.min = value.parse().unwrap_or(config.gauge.min),
        "gauge.max" => config.gauge.max = value.parse().unwrap_or(config.gauge.max),
        "gauge.steps" => {
            if let Ok(v) = serde_json::from_str(value) {
                config.gauge.steps = v;
            }
        }
        "palette" => {
            if let Ok(v) = serde_json::from_str::<Vec<String>>(value) {
                if !v.is_empty() {
                    config.palette = v;
                }
            }
        }
        _ => {
            log::warn!("Unknown configuration key ignored: {}", key);
            return false;
        }
    }
    true
}
