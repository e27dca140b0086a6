//! Explorer configuration stored in `explorer.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Environment variable overriding `results_dir`.
pub const RESULTS_DIR_ENV: &str = "EXPLORER_RESULTS_DIR";

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "explorer.toml";

/// Explorer configuration (TOML).
///
/// Missing fields default to the layout the pipeline writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Root of the results tree.
    pub results_dir: PathBuf,

    /// Regex a root child must match to be listed as a subject.
    pub subject_pattern: String,

    /// Extension of every artifact file, without the leading dot.
    pub image_extension: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            subject_pattern: "^sub-".to_string(),
            image_extension: "png".to_string(),
        }
    }
}

impl ExplorerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.results_dir.as_os_str().is_empty() {
            return Err(anyhow!("results_dir must not be empty"));
        }
        Regex::new(&self.subject_pattern)
            .with_context(|| format!("subject_pattern {:?}", self.subject_pattern))?;
        let ext = self.image_extension.as_str();
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(anyhow!(
                "image_extension must be a bare extension such as \"png\", got {ext:?}"
            ));
        }
        Ok(())
    }

    /// Apply `EXPLORER_RESULTS_DIR` when set and non-empty.
    pub fn apply_env(mut self) -> Self {
        if let Some(dir) = std::env::var_os(RESULTS_DIR_ENV).filter(|dir| !dir.is_empty()) {
            self.results_dir = PathBuf::from(dir);
        }
        self
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ExplorerConfig::default()`.
pub fn load_config(path: &Path) -> Result<ExplorerConfig> {
    if !path.exists() {
        let cfg = ExplorerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ExplorerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the effective config: file, then environment, then an explicit
/// results directory (highest precedence).
pub fn resolve_config(path: &Path, results_dir: Option<PathBuf>) -> Result<ExplorerConfig> {
    let mut cfg = load_config(path)?.apply_env();
    if let Some(dir) = results_dir {
        cfg.results_dir = dir;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ExplorerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
