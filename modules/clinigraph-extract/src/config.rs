use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::extractor::ExtractOptions;

/// TOML-backed extraction settings. Every key is optional.
/// The API key stays in the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub extraction: ExtractionSection,
    #[serde(default)]
    pub risk: RiskSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionSection {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub project_risk_coverage: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskSection {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub write_file: Option<bool>,
    pub base_dir: Option<PathBuf>,
    pub path: Option<PathBuf>,
}

impl FileConfig {
    /// Overlay the keys present in this file onto `options`.
    pub fn apply(&self, options: &mut ExtractOptions) {
        let extraction = &self.extraction;
        if let Some(ref model) = extraction.model {
            options.model = model.clone();
        }
        if let Some(t) = extraction.temperature {
            options.temperature = Some(t);
        }
        if let Some(n) = extraction.max_output_tokens {
            options.max_output_tokens = Some(n);
        }
        if let Some(enabled) = extraction.project_risk_coverage {
            options.project_risk_coverage = enabled;
        }

        let risk = &self.risk;
        if let Some(ref model) = risk.model {
            options.risk.model = Some(model.clone());
        }
        if let Some(t) = risk.temperature {
            options.risk.temperature = Some(t);
        }
        if let Some(n) = risk.max_output_tokens {
            options.risk.max_output_tokens = Some(n);
        }

        let output = &self.output;
        if let Some(write) = output.write_file {
            options.output.write_file = write;
        }
        if let Some(ref dir) = output.base_dir {
            options.output.base_dir = dir.clone();
        }
        if let Some(ref path) = output.path {
            options.output.path = Some(path.clone());
        }
    }
}

/// Parse TOML config text.
pub fn parse_config(content: &str) -> Result<FileConfig> {
    Ok(toml::from_str(content)?)
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
