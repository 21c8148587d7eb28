//! Run configuration and the static config file.
//!
//! `RunConfig` is built once from the command line and shared by reference
//! across all workers. `StaticConfig` comes from a JSON file and is loaded
//! lazily, exactly once per process, through [`StaticConfigCell`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::Value;

use crate::cli::Cli;
use crate::errors::{Error, Result};
use crate::logging::MsgCode;
use crate::warn_code;

/// File name of the static config next to the executable.
pub const STATIC_CONFIG_FILE: &str = "static_config.json";

pub mod environment {
    //! `LINT_ENABLE_COPYRIGHT_UPDATE` handling.

    pub const ENABLE_COPYRIGHT_UPDATE: &str = "LINT_ENABLE_COPYRIGHT_UPDATE";

    const FALSE_VALUES: [&str; 5] = ["False", "false", "F", "f", "0"];

    /// A falsy value forces read-only mode for the whole run.
    pub fn copyright_update_not_allowed() -> bool {
        match std::env::var(ENABLE_COPYRIGHT_UPDATE) {
            Ok(value) => FALSE_VALUES.contains(&value.as_str()),
            Err(_) => false,
        }
    }

    /// Author updates are permitted only while the variable is unset or empty.
    pub fn update_authors_permitted() -> bool {
        std::env::var(ENABLE_COPYRIGHT_UPDATE)
            .map(|value| value.is_empty())
            .unwrap_or(true)
    }
}

/// Per-run update switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub update_component: bool,
    pub update_copyright: bool,
    pub update_filename: bool,
    pub update_authors: bool,
    pub update_authors_only_if_empty: bool,
    pub dont_skip_broken_merges: bool,
    pub read_only: bool,
    pub verbose: bool,
}

/// Immutable per-run record, constructed once from CLI arguments.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub options: RunOptions,
    /// Empty means "remove the component field".
    pub component_name: String,
    /// `i32::MAX` stands for "unlimited".
    pub max_blame_authors: i32,
    pub static_config_path: PathBuf,
    pub target_paths: Vec<PathBuf>,
}

impl RunConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let mut options = RunOptions {
            verbose: cli.verbose,
            update_copyright: cli.update_copyright,
            update_filename: cli.update_filename,
            update_authors_only_if_empty: cli.update_authors_only_if_empty,
            dont_skip_broken_merges: cli.dont_skip_broken_merges,
            ..RunOptions::default()
        };

        let component_name = cli.component.clone().unwrap_or_default();
        if cli.component.is_some() {
            options.update_component = true;
            if component_name.is_empty() {
                warn_code!(
                    MsgCode::BadComponentName,
                    "Component name is empty, that is why this field will be deleted."
                );
            }
        }

        if cli.update_authors && environment::update_authors_permitted() {
            options.update_authors = true;
        }

        let max_blame_authors = match &cli.max_blame_authors {
            None => i32::MAX,
            Some(raw) => {
                let parsed = raw.parse::<i32>().map_err(|_| {
                    Error::BadMaxBlameAuthors("--max-blame-authors-to-start-update".to_string())
                })?;
                if parsed > 0 {
                    parsed
                } else {
                    i32::MAX
                }
            }
        };

        let static_config_path = match cli.static_config {
            Some(path) => {
                if path.as_os_str().is_empty() {
                    return Err(Error::BadStaticConfigPath);
                }
                path
            }
            None => default_static_config_path()?,
        };
        if options.verbose {
            log::debug!("Using static-config path {}", static_config_path.display());
        }

        options.read_only = cli.dry || environment::copyright_update_not_allowed();

        let target_paths = cli.paths;
        if target_paths.is_empty() || target_paths[0].as_os_str().is_empty() {
            return Err(Error::BadTargetPaths);
        }

        Ok(Self {
            options,
            component_name,
            max_blame_authors,
            static_config_path,
            target_paths,
        })
    }
}

fn default_static_config_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|err| anyhow::anyhow!("cannot resolve executable path: {err}"))?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable path has no parent directory"))?;
    Ok(dir.join(STATIC_CONFIG_FILE))
}

/// Static configuration loaded from JSON: author aliases, the copyright
/// template, and excluded path substrings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticConfig {
    pub author_aliases: HashMap<String, String>,
    pub copyright_field_template: String,
    pub excluded_path_sections: Vec<String>,
}

/// Parse and validate the static config, reporting the offending key.
fn parse_static_config(content: &str) -> std::result::Result<StaticConfig, String> {
    let root: Value = serde_json::from_str(content).map_err(|err| err.to_string())?;

    let object = root
        .as_object()
        .filter(|object| !object.is_empty())
        .ok_or_else(|| "root object is empty".to_string())?;

    let checks: [(&str, fn(&Value) -> bool, &str); 3] = [
        ("author_aliases", Value::is_object, "map"),
        ("copyright_field_template", Value::is_string, "string"),
        ("excluded_path_sections", Value::is_array, "array"),
    ];
    for (key, type_check, type_name) in checks {
        if !object.get(key).map(type_check).unwrap_or(false) {
            return Err(format!("{type_name} '{key}' not found"));
        }
    }

    serde_json::from_value(root).map_err(|err| err.to_string())
}

fn load_static_config(path: &Path) -> std::result::Result<StaticConfig, String> {
    let content = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    parse_static_config(&content)
}

/// Explicit one-shot handle to the process-wide static config.
///
/// Passed through the pipeline instead of living as an ambient global; the
/// load happens on first demand and the outcome (including failure) sticks.
#[derive(Debug)]
pub struct StaticConfigCell {
    path: PathBuf,
    cell: OnceLock<std::result::Result<StaticConfig, String>>,
}

impl StaticConfigCell {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cell: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Result<&StaticConfig> {
        self.cell
            .get_or_init(|| load_static_config(&self.path))
            .as_ref()
            .map_err(|reason| Error::BadStaticConfigFormat {
                path: self.path.clone(),
                reason: reason.clone(),
            })
    }
}
