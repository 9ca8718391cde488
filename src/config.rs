//! Configuration loading from sweepmap.toml and pyproject.toml.
//!
//! Follows the same conventions as ruff/black/mypy:
//! - Standalone sweepmap.toml in the project root
//! - `[tool.sweepmap]` section in pyproject.toml as fallback
//!
//! ## Example
//!
//! ```toml
//! [tool.sweepmap]
//! log = "logs/screens.log"
//! results = "results"
//! include = ["**/*.json"]
//! exclude = ["**/scratch/**"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Result files picked up when no `include` is configured.
pub const DEFAULT_INCLUDES: &[&str] = &["*.json", "**/*.json"];

/// sweepmap configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// Captured session log to parse.
    pub log: Option<PathBuf>,

    /// Directory holding per-run JSON result files.
    pub results: Option<PathBuf>,

    /// Glob patterns (relative to the results directory) for result files.
    /// Empty means [`DEFAULT_INCLUDES`].
    pub include: Vec<String>,

    /// Glob patterns for result files to skip.
    pub exclude: Vec<String>,
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    log: Option<String>,
    results: Option<String>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

/// Wrapper for pyproject.toml structure.
#[derive(Debug, Deserialize)]
struct PyProject {
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize)]
struct PyProjectTool {
    sweepmap: Option<RawConfig>,
}

impl Config {
    /// Load configuration from the given directory.
    ///
    /// Search order:
    /// 1. sweepmap.toml in directory
    /// 2. pyproject.toml [tool.sweepmap] in directory
    /// 3. Walk up to find pyproject.toml
    /// 4. Default config if nothing found
    ///
    /// Relative `log`/`results` paths resolve against the config file's directory.
    pub fn load(directory: &Path) -> Self {
        let sweepmap_toml = directory.join("sweepmap.toml");
        if sweepmap_toml.exists() {
            if let Some(config) = Self::load_sweepmap_toml(&sweepmap_toml) {
                return config;
            }
        }

        let mut current = Some(directory.to_path_buf());
        while let Some(dir) = current {
            let pyproject = dir.join("pyproject.toml");
            if pyproject.exists() {
                if let Some(config) = Self::load_pyproject(&pyproject) {
                    return config;
                }
            }
            current = dir.parent().map(Path::to_path_buf);
        }

        Self::default()
    }

    fn load_sweepmap_toml(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Self::parse_sweepmap_toml(&content, path)
    }

    fn load_pyproject(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Self::parse_pyproject(&content, path)
    }

    fn parse_sweepmap_toml(content: &str, path: &Path) -> Option<Self> {
        match toml::from_str::<RawConfig>(content) {
            Ok(raw) => Some(Self::from_raw(raw, path.to_path_buf())),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                None
            }
        }
    }

    fn parse_pyproject(content: &str, path: &Path) -> Option<Self> {
        let pyproject: PyProject = toml::from_str(content).ok()?;
        let raw = pyproject.tool?.sweepmap?;
        Some(Self::from_raw(raw, path.to_path_buf()))
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        let base = source.parent().map(Path::to_path_buf).unwrap_or_default();
        let resolve = |p: String| base.join(p);

        Self {
            log: raw.log.map(resolve),
            results: raw.results.map(resolve),
            include: raw.include.unwrap_or_default(),
            exclude: raw.exclude.unwrap_or_default(),
            source: Some(source),
        }
    }

    /// Effective include patterns (configured, or the defaults).
    pub fn effective_includes(&self) -> Vec<String> {
        if self.include.is_empty() {
            DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect()
        } else {
            self.include.clone()
        }
    }

    /// Check if a relative result path should be loaded
    /// (matches an include AND no exclude).
    pub fn should_include(&self, rel_path: &Path) -> bool {
        let path_str = rel_path.to_string_lossy();
        let included = self
            .effective_includes()
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &path_str));
        included
            && !self
                .exclude
                .iter()
                .any(|pattern| glob_match::glob_match(pattern, &path_str))
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        match self.source {
            Some(ref source) => lines.push(format!("   Config: {}", source.display())),
            None => lines.push("   Config: (defaults)".to_string()),
        }
        if let Some(ref log) = self.log {
            lines.push(format!("   Log: {}", log.display()));
        }
        if let Some(ref results) = self.results {
            lines.push(format!("   Results: {}", results.display()));
        }
        lines.push(format!("   Include: {}", self.effective_includes().join(", ")));
        if !self.exclude.is_empty() {
            lines.push(format!("   Exclude: {}", self.exclude.join(", ")));
        }

        lines.join("\n")
    }
}
