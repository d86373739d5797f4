use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub animation: AnimationConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// One company to load: display name, CSV path, optional line color.
/// Declared as an ordered list — the order here is the draw order, the
/// legend order and the summary-panel order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompanySource {
    pub name: String,
    pub path: PathBuf,

    /// "#RRGGBB"; falls back to the built-in palette by position.
    #[serde(default)]
    pub color: Option<String>,
}

/// Which companies to animate
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_companies")]
    pub companies: Vec<CompanySource>,
}

/// Playback configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnimationConfig {
    /// Frames across the full date span. More frames = smoother reveal.
    #[serde(default = "default_frame_count")]
    pub frame_count: usize,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_true")]
    pub repeat: bool,
}

/// Frame-dump export for an external encoder (disabled by default)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_out_path")]
    pub out_path: PathBuf,

    #[serde(default = "default_fps")]
    pub fps: u32,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

/// Fallback palette, assigned by company position when no color is configured.
pub const DEFAULT_PALETTE: &[&str] = &[
    "#FF6B6B", // red
    "#4ECDC4", // teal
    "#45B7D1", // blue
    "#FF9F43", // orange
    "#6C5CE7", // purple
    "#00B894", // green
    "#E17055", // coral
];

fn default_companies() -> Vec<CompanySource> {
    const DEFAULTS: &[(&str, &str)] = &[
        ("AMD", "data/amd.csv"),
        ("NVIDIA", "data/nvidia.csv"),
        ("Intel", "data/intel.csv"),
        ("Apple", "data/apple.csv"),
        ("Microsoft", "data/microsoft.csv"),
        ("Tesla", "data/tesla.csv"),
        ("Qualcomm", "data/qualcomm.csv"),
    ];

    DEFAULTS
        .iter()
        .enumerate()
        .map(|(i, &(name, path))| CompanySource {
            name: name.to_string(),
            path: PathBuf::from(path),
            color: Some(DEFAULT_PALETTE[i % DEFAULT_PALETTE.len()].to_string()),
        })
        .collect()
}

fn default_frame_count() -> usize {
    200
}
fn default_tick_interval_ms() -> u64 {
    50
}
fn default_out_path() -> PathBuf {
    PathBuf::from("export/frames.ndjson")
}
fn default_fps() -> u32 {
    20
}
fn default_true() -> bool {
    true
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("REPLAY").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            animation: AnimationConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            companies: default_companies(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_count: default_frame_count(),
            tick_interval_ms: default_tick_interval_ms(),
            repeat: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            out_path: default_out_path(),
            fps: default_fps(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.animation.frame_count, 200);
        assert_eq!(cfg.animation.tick_interval_ms, 50);
        assert!(cfg.animation.repeat);
        assert!(!cfg.export.enabled);
        assert_eq!(cfg.data.companies.len(), 7);
        assert_eq!(cfg.data.companies[0].name, "AMD");
    }

    #[test]
    fn default_companies_carry_palette_colors() {
        let cfg = AppConfig::default();
        for (i, c) in cfg.data.companies.iter().enumerate() {
            assert_eq!(c.color.as_deref(), Some(DEFAULT_PALETTE[i]));
        }
    }
}
