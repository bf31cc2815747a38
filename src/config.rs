//! Per-repository configuration (`<git-dir>/merge-index.toml`).
//!
//! Supplies defaults for the failure-policy switches and a table of
//! merge-program aliases. Missing file → all defaults (no error).
//!
//! ```toml
//! [run]
//! one_shot = true
//! quiet = false
//!
//! [programs]
//! resolve = "git-merge-one-file"
//! ```

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::MergeIndexError;
use crate::run::RunOptions;

/// File name looked up inside the git directory.
pub const CONFIG_FILE: &str = "merge-index.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level merge-index configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeIndexConfig {
    /// Failure policy defaults.
    #[serde(default)]
    pub run: RunConfig,

    /// Merge program aliases: `name = "command"`.
    #[serde(default)]
    pub programs: BTreeMap<String, String>,
}

/// Defaults for `-o` and `-q`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Behave as if `-o` was given.
    #[serde(default)]
    pub one_shot: bool,

    /// Behave as if `-q` was given.
    #[serde(default)]
    pub quiet: bool,
}

impl MergeIndexConfig {
    /// Path of the config file for a repository.
    #[must_use]
    pub fn path_in(git_dir: &Path) -> PathBuf {
        git_dir.join(CONFIG_FILE)
    }

    /// Load the config from `path`, or defaults if the file does not exist.
    ///
    /// # Errors
    /// [`MergeIndexError::Config`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, MergeIndexError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(MergeIndexError::Config {
                    path: path.to_owned(),
                    message: e.to_string(),
                });
            }
        };
        Self::parse(&text).map_err(|message| MergeIndexError::Config {
            path: path.to_owned(),
            message,
        })
    }

    /// Parse config text.
    ///
    /// # Errors
    /// Returns the TOML parser's message on malformed input or unknown keys.
    pub fn parse(text: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        if let Some((alias, _)) = config.programs.iter().find(|(_, cmd)| cmd.trim().is_empty()) {
            return Err(format!("program alias `{alias}` has an empty command"));
        }
        Ok(config)
    }

    /// Combine command-line switches with configured defaults. Flags can
    /// only switch behaviour on.
    #[must_use]
    pub const fn effective_options(&self, cli: RunOptions) -> RunOptions {
        RunOptions {
            one_shot: cli.one_shot || self.run.one_shot,
            quiet: cli.quiet || self.run.quiet,
        }
    }

    /// Replace `program` by its alias target, if one is configured.
    /// Aliases are UTF-8; any other program name is returned unchanged.
    #[must_use]
    pub fn resolve_program<'a>(&'a self, program: &'a OsStr) -> &'a OsStr {
        program
            .to_str()
            .and_then(|name| self.programs.get(name))
            .map_or(program, |cmd| OsStr::new(cmd.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_default() {
        assert_eq!(MergeIndexConfig::parse("").unwrap(), MergeIndexConfig::default());
    }

    #[test]
    fn parses_run_and_programs() {
        let cfg = MergeIndexConfig::parse(
            r#"
            [run]
            one_shot = true

            [programs]
            resolve = "git-merge-one-file"
            "#,
        )
        .unwrap();
        assert!(cfg.run.one_shot);
        assert!(!cfg.run.quiet);
        assert_eq!(cfg.resolve_program(OsStr::new("resolve")), "git-merge-one-file");
        assert_eq!(cfg.resolve_program(OsStr::new("other-tool")), "other-tool");
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(MergeIndexConfig::parse("[run]\nparallel = true\n").is_err());
        assert!(MergeIndexConfig::parse("verbose = true\n").is_err());
    }

    #[test]
    fn rejects_empty_alias() {
        let err = MergeIndexConfig::parse("[programs]\nx = \"  \"\n").unwrap_err();
        assert!(err.contains("`x`"));
    }

    #[test]
    fn cli_flags_or_with_defaults() {
        let cfg = MergeIndexConfig {
            run: RunConfig {
                one_shot: false,
                quiet: true,
            },
            ..MergeIndexConfig::default()
        };
        let eff = cfg.effective_options(RunOptions {
            one_shot: true,
            quiet: false,
        });
        assert_eq!(
            eff,
            RunOptions {
                one_shot: true,
                quiet: true
            }
        );
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = MergeIndexConfig::load(&MergeIndexConfig::path_in(dir.path())).unwrap();
        assert_eq!(cfg, MergeIndexConfig::default());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = MergeIndexConfig::path_in(dir.path());
        std::fs::write(&path, "[run\n").unwrap();
        let err = MergeIndexConfig::load(&path).unwrap_err();
        assert!(matches!(err, MergeIndexError::Config { .. }));
    }
}
