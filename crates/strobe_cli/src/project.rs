//! Shared project loading for the CLI subcommands.

use std::path::{Path, PathBuf};

use strobe_config::{StrobeConfig, TestDef, CONFIG_FILE};

use crate::GlobalArgs;

/// A loaded configuration and the directory it was read from.
#[derive(Debug)]
pub struct Project {
    /// Directory relative paths in the configuration resolve against.
    pub root: PathBuf,
    /// The parsed configuration.
    pub config: StrobeConfig,
}

impl Project {
    /// Resolves a directory argument, falling back to `project.output_dir`.
    /// Relative paths are taken from the project root.
    pub fn dir_or_output(&self, arg: Option<&str>) -> PathBuf {
        let dir = Path::new(arg.unwrap_or(&self.config.project.output_dir));
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.root.join(dir)
        }
    }

    /// Returns the tests matching `filter`, or every test if it is `None`.
    ///
    /// A filter matches a test by `name` or by `module/name`. Matching
    /// nothing is an error.
    pub fn select(&self, filter: Option<&str>) -> Result<Vec<&TestDef>, Box<dyn std::error::Error>> {
        let selected: Vec<&TestDef> = self
            .config
            .tests
            .iter()
            .filter(|t| filter.map_or(true, |f| matches_filter(t, f)))
            .collect();
        match filter {
            Some(f) if selected.is_empty() => Err(format!("no test named '{f}'").into()),
            _ => Ok(selected),
        }
    }
}

fn matches_filter(test: &TestDef, filter: &str) -> bool {
    match filter.split_once('/') {
        Some((module, name)) => test.module == module && test.name == name,
        None => test.name == filter,
    }
}

/// Loads the configuration named by `--config`, or `strobe.toml` in the
/// current directory.
///
/// `--config` may name the file itself or the directory holding it.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let path = match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_dir() {
                p.join(CONFIG_FILE)
            } else {
                p
            }
        }
        None => std::env::current_dir()?.join(CONFIG_FILE),
    };
    let config = strobe_config::load_config_file(&path)?;
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    tracing::debug!(path = %path.display(), tests = config.tests.len(), "loaded configuration");
    Ok(Project { root, config })
}
