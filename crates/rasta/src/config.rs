//! Configuration for rasta.
//!
//! Loads config from:
//! 1. Global: ~/.config/rasta/config.toml
//! 2. Per-project: .rasta/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [convert]
//! max_tasks = 8
//! channel_capacity = 16
//!
//! [output]
//! format = "json"
//! context_path = ["System"]
//! ```

use crate::eval::EvalOptions;
use crate::serialize::ContextPath;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Output encoding of the expression stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Evaluator settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConvertConfig {
    /// Maximum number of conversion tasks alive at once.
    pub max_tasks: Option<usize>,
    /// Entries buffered between producer and consumer.
    pub channel_capacity: Option<usize>,
}

/// Serializer settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    /// Contexts whose symbols render unqualified.
    pub context_path: Option<ContextPath>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RastaConfig {
    pub convert: ConvertConfig,
    pub output: OutputConfig,
}

impl RastaConfig {
    /// Load configuration for a project.
    ///
    /// Loads global config from ~/.config/rasta/config.toml,
    /// then merges with per-project config from .rasta/config.toml.
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global) = Self::global_config_path().and_then(|p| Self::load_file(&p)) {
            config = config.merge(global);
        }

        let project_path = root.join(".rasta").join("config.toml");
        if let Some(project) = Self::load_file(&project_path) {
            config = config.merge(project);
        }

        config
    }

    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("rasta").join("config.toml"))
    }

    fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                None
            }
        }
    }

    /// Merge another config into this one. Fields set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            convert: ConvertConfig {
                max_tasks: other.convert.max_tasks.or(self.convert.max_tasks),
                channel_capacity: other
                    .convert
                    .channel_capacity
                    .or(self.convert.channel_capacity),
            },
            output: OutputConfig {
                format: other.output.format.or(self.output.format),
                context_path: other.output.context_path.or(self.output.context_path),
            },
        }
    }

    pub fn eval_options(&self) -> EvalOptions {
        let options = EvalOptions::default();
        match self.convert.max_tasks {
            Some(n) => options.with_max_tasks(n),
            None => options,
        }
    }

    pub fn channel_capacity(&self) -> usize {
        self.convert.channel_capacity.unwrap_or(64).max(1)
    }

    pub fn format(&self) -> OutputFormat {
        self.output.format.unwrap_or_default()
    }

    pub fn context_path(&self) -> ContextPath {
        self.output.context_path.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_project_config(dir: &TempDir, body: &str) {
        let rasta_dir = dir.path().join(".rasta");
        std::fs::create_dir_all(&rasta_dir).unwrap();
        let mut file = std::fs::File::create(rasta_dir.join("config.toml")).unwrap();
        writeln!(file, "{body}").unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = RastaConfig::default();
        assert_eq!(config.format(), OutputFormat::Text);
        assert_eq!(config.channel_capacity(), 64);
        assert_eq!(config.context_path(), ContextPath::default());
        assert!(config.eval_options().max_tasks >= 1);
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        write_project_config(
            &dir,
            r#"
[convert]
max_tasks = 3
channel_capacity = 0

[output]
format = "json"
context_path = ["System"]
"#,
        );

        let config = RastaConfig::load(dir.path());
        assert_eq!(config.eval_options().max_tasks, 3);
        assert_eq!(config.channel_capacity(), 1);
        assert_eq!(config.format(), OutputFormat::Json);
        assert_eq!(config.context_path(), ContextPath::system_only());
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let base: RastaConfig = toml::from_str("[convert]\nmax_tasks = 2\n").unwrap();
        let over: RastaConfig = toml::from_str("[output]\nformat = \"json\"\n").unwrap();
        let merged = base.merge(over);
        assert_eq!(merged.convert.max_tasks, Some(2));
        assert_eq!(merged.format(), OutputFormat::Json);
    }

    #[test]
    fn test_invalid_project_config_is_ignored() {
        let dir = TempDir::new().unwrap();
        write_project_config(&dir, "[output]\nformat = \"yaml\"\n");
        let config = RastaConfig::load(dir.path());
        assert_eq!(config.output.format, None);
    }
}
