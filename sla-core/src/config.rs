use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::WindowSize;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub path: Option<PathBuf>, // JSON-lines input file
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_window_size")]
    pub size: String, // e.g., "10", "10m", "1h"
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: default_window_size(),
        }
    }
}

fn default_window_size() -> String {
    WindowSize::DEFAULT_MINUTES.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SinkConfig {
    #[serde(default = "default_sink_path")]
    pub path: PathBuf, // "-" writes to stdout
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: default_sink_path(),
        }
    }
}

fn default_sink_path() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source.path.is_none() {
            anyhow::bail!("source.path must be set (input file with one event per line)");
        }
        if self.sink.path.as_os_str().is_empty() {
            anyhow::bail!("sink.path must not be empty");
        }
        self.window_size()?;
        Ok(())
    }

    pub fn window_size(&self) -> anyhow::Result<WindowSize> {
        let minutes = parse_window_minutes(&self.window.size)?;
        Ok(WindowSize::new(minutes)?)
    }

    /// True when output goes to stdout instead of a file.
    pub fn sink_is_stdout(&self) -> bool {
        self.sink.path.as_os_str() == "-"
    }
}

pub fn parse_window_minutes(s: &str) -> anyhow::Result<i64> {
    // "10m", "2h"; bare numbers are minutes
    let s = s.trim();
    if let Some(num) = s.strip_suffix('m') {
        return Ok(num.trim().parse::<i64>()?);
    }
    if let Some(num) = s.strip_suffix('h') {
        return Ok(num.trim().parse::<i64>()? * 60);
    }
    Ok(s.parse::<i64>()?)
}
