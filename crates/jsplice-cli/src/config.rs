//! Configuration file support for jsplice
//!
//! Loads `.jsplice.toml` from the current directory or a parent directory.

use anyhow::{Context, Result};
use jsplice_core::FormatOptions;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".jsplice.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rules: RulesConfig,
    pub paths: PathsConfig,
    pub output: OutputConfig,
    /// Printer options used when writing rewritten files
    pub format: FormatOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// If set, only these rules will run
    pub enabled: Option<Vec<String>>,
    /// Rules to exclude (applied after enabled)
    pub disabled: Vec<String>,
    /// YAML rule files or directories, relative to the config file
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Glob patterns to exclude from processing
    pub exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "json" or "diff"
    pub format: Option<String>,
}

impl Config {
    /// Load config from `.jsplice.toml` searching from the current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.rules.paths = config
                .rules
                .paths
                .iter()
                .map(|rule_path| base.join(rule_path))
                .collect();
        }
        Ok(config)
    }

    /// Compute the effective set of enabled rules
    pub fn effective_rules(&self, all_rules: &[&str], cli_rules: &[String]) -> HashSet<String> {
        // CLI rules override config completely
        if !cli_rules.is_empty() {
            return cli_rules.iter().cloned().collect();
        }

        let mut rules: HashSet<String> = match &self.rules.enabled {
            Some(enabled) => enabled.iter().cloned().collect(),
            None => all_rules.iter().map(|s| s.to_string()).collect(),
        };

        for disabled in &self.rules.disabled {
            rules.remove(disabled);
        }

        rules
    }

    /// Check if a path should be excluded based on config patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.paths.exclude {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }

            // Directory patterns such as `node_modules/`
            if pattern.ends_with('/') {
                let dir_pattern = pattern.trim_end_matches('/');
                if path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern))
                {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsplice_core::Quotes;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_load_basic_config() {
        let temp = TempDir::new().unwrap();
        create_config(
            temp.path(),
            r#"
[rules]
enabled = ["guard_debug", "strip_console"]
disabled = ["strip_console"]
paths = ["rules"]

[paths]
exclude = ["node_modules/", "*.min.js"]

[output]
format = "json"

[format]
indent = "  "
quotes = "double"
"#,
        );

        let (config, path) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert_eq!(
            config.rules.enabled,
            Some(vec!["guard_debug".to_string(), "strip_console".to_string()])
        );
        assert_eq!(config.rules.disabled, vec!["strip_console".to_string()]);
        assert_eq!(config.rules.paths, vec![temp.path().join("rules")]);
        assert_eq!(
            config.paths.exclude,
            vec!["node_modules/".to_string(), "*.min.js".to_string()]
        );
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.format.indent, "  ");
        assert_eq!(config.format.quotes, Quotes::Double);
        assert!(config.format.semicolons);
    }

    #[test]
    fn test_load_empty_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "");

        let (config, _) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert!(config.rules.enabled.is_none());
        assert!(config.rules.disabled.is_empty());
        assert!(config.rules.paths.is_empty());
        assert!(config.paths.exclude.is_empty());
        assert!(config.output.format.is_none());
        assert_eq!(config.format, FormatOptions::default());
    }

    #[test]
    fn test_load_from_parent_directory() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[rules]\ndisabled = [\"guard_debug\"]\n");
        let nested = temp.path().join("src").join("lib");
        fs::create_dir_all(&nested).unwrap();

        let (config, path) = Config::load_from(nested).unwrap().unwrap();
        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert_eq!(config.rules.disabled, vec!["guard_debug".to_string()]);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[rules\n");
        assert!(Config::load_from(temp.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(temp.path().to_path_buf()).unwrap();
        assert!(result.is_none());
    }

    // ==================== Rule selection ====================

    #[test]
    fn test_effective_rules_cli_override() {
        let config = Config::default();
        let all_rules = &["guard_debug", "strip_console", "array_literal"];
        let cli_rules = vec!["guard_debug".to_string()];

        let effective = config.effective_rules(all_rules, &cli_rules);

        assert_eq!(effective.len(), 1);
        assert!(effective.contains("guard_debug"));
    }

    #[test]
    fn test_effective_rules_with_disabled() {
        let config = Config {
            rules: RulesConfig {
                disabled: vec!["strip_console".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let all_rules = &["guard_debug", "strip_console", "array_literal"];

        let effective = config.effective_rules(all_rules, &[]);

        assert_eq!(effective.len(), 2);
        assert!(effective.contains("guard_debug"));
        assert!(effective.contains("array_literal"));
        assert!(!effective.contains("strip_console"));
    }

    // ==================== Exclusion ====================

    #[test]
    fn test_should_exclude_glob() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["*.min.js".to_string()],
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("dist/app.min.js")));
        assert!(!config.should_exclude(Path::new("app.js")));
    }

    #[test]
    fn test_should_exclude_directory() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["node_modules/".to_string()],
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("project/node_modules/lodash/index.js")));
        assert!(config.should_exclude(Path::new("node_modules/react/index.js")));
        assert!(!config.should_exclude(Path::new("src/node_modules.js")));
    }
}
