use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::window::{DEFAULT_LOOKBACK_DAYS, DEFAULT_PERIOD_SECS};

/// Default audit target regions. The EC2 and CloudWatch APIs are
/// region-scoped, so every region is visited with its own clients.
pub const DEFAULT_REGIONS: [&str; 18] = [
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "sa-east-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "eu-north-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-south-1",
    "ap-east-1",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub audit: AuditConfig,
    pub reports: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Regions to audit, in order
    pub regions: Vec<String>,
    /// Metric lookback window in days
    pub lookback_days: i64,
    /// Metric aggregation period in seconds
    pub period_secs: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory the four CSV reports are written into
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audit: AuditConfig {
                regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
                lookback_days: DEFAULT_LOOKBACK_DAYS,
                period_secs: DEFAULT_PERIOD_SECS,
            },
            reports: ReportConfig {
                output_dir: PathBuf::from("."),
            },
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .costctl.toml in current dir, then ~/.config/costctl/config.toml
            let local = PathBuf::from(".costctl.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("costctl").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".costctl.toml"))
            }
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config: Config = toml::from_str(&content).with_context(|| {
                let mut err = format!("Failed to parse config: {}", config_path.display());
                err.push_str("\n  Common issues:");
                err.push_str("\n    - Invalid TOML syntax");
                err.push_str("\n    - Missing required fields");
                err.push_str("\n    - Incorrect value types");
                err.push_str("\n  Tip: Run 'costctl init' to create a new config file");
                err
            })?;
            config.validate()?;
            Ok(config)
        } else {
            // Use defaults but warn if user explicitly provided a path
            if path.is_some() {
                eprintln!("WARNING: Config file not found: {}", config_path.display());
                eprintln!(
                    "   Using default configuration. Run 'costctl init' to create a config file."
                );
            }
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.audit.regions.is_empty() {
            anyhow::bail!("audit.regions must not be empty");
        }
        if self.audit.lookback_days <= 0 {
            anyhow::bail!(
                "audit.lookback_days must be positive, got {}",
                self.audit.lookback_days
            );
        }
        if self.audit.period_secs < 60 {
            anyhow::bail!(
                "audit.period_secs must be at least 60, got {}",
                self.audit.period_secs
            );
        }
        Ok(())
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
