use crate::lint::LintSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexClippyConfig {
    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    #[serde(default)]
    pub disabled: Vec<String>,

    #[serde(default)]
    pub preview: bool,
}

/// Overrides for [`LintSettings`]; absent keys keep the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub max_rule_iterations: Option<usize>,
    pub max_passes: Option<usize>,
    pub strip_captures: Option<bool>,
}

impl EngineConfig {
    pub fn settings(&self) -> LintSettings {
        let defaults = LintSettings::default();
        LintSettings {
            max_rule_iterations: self
                .max_rule_iterations
                .unwrap_or(defaults.max_rule_iterations),
            max_passes: self.max_passes.unwrap_or(defaults.max_passes),
            strip_captures: self.strip_captures.unwrap_or(defaults.strip_captures),
        }
    }
}

pub const DEFAULT_CONFIG_FILE_NAME: &str = "regex-clippy.toml";

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}

pub fn load_config_file(path: &Path) -> Result<RegexClippyConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let cfg: RegexClippyConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_config(
    explicit_path: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<(PathBuf, RegexClippyConfig)>> {
    if let Some(p) = explicit_path {
        let cfg = load_config_file(p)?;
        return Ok(Some((p.to_path_buf(), cfg)));
    }

    let Some(p) = find_config_file(start_dir) else {
        return Ok(None);
    };
    let cfg = load_config_file(&p)?;
    Ok(Some((p, cfg)))
}
