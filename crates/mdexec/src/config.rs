//! Configuration file discovery and parsing
//!
//! Searches for `.config/mdexec.yaml` walking up from the current directory.
//! The project root is the parent of `.config/`. Without a config file the
//! current directory is the project root and every setting has its default.

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, eyre};
use mdexec_config::{CONFIG_FILE, MdexecConfig};
use mdexec_typescript::RuntimeConfig;
use std::env;

/// Configuration directory name
const CONFIG_DIR: &str = ".config";

/// Discovered configuration with resolved paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Directory holding `.config/` (or the start directory)
    pub root: Utf8PathBuf,
    /// The file the config came from, if any
    pub config_path: Option<Utf8PathBuf>,
    /// Parsed config
    pub config: MdexecConfig,
}

impl ResolvedConfig {
    /// Discover and load configuration from the current directory
    pub fn discover() -> Result<Self> {
        let cwd = env::current_dir()?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
            eyre!(
                "Current directory is not valid UTF-8: {}",
                e.as_path().display()
            )
        })?;
        Self::discover_from(&cwd)
    }

    /// Discover and load configuration walking up from `start`
    pub fn discover_from(start: &Utf8Path) -> Result<Self> {
        match find_config_file(start) {
            Some(path) => {
                let config = load_config(&path)?;
                // Project root is the parent of .config/
                let root = path
                    .parent()
                    .and_then(Utf8Path::parent)
                    .ok_or_else(|| eyre!(".config directory has no parent"))?
                    .to_owned();
                tracing::debug!("Loaded {}", path);
                Ok(Self {
                    root,
                    config_path: Some(path),
                    config,
                })
            }
            None => Ok(Self {
                root: start.to_owned(),
                config_path: None,
                config: MdexecConfig::default(),
            }),
        }
    }

    /// The project root programs run in, honouring `project_root`
    pub fn project_root(&self) -> Utf8PathBuf {
        match &self.config.project_root {
            Some(relative) => self.root.join(relative),
            None => self.root.clone(),
        }
    }

    /// Settings for the TypeScript runner
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::from_config(
            &self.config.typescript(),
            Some(self.project_root().into_std_path_buf()),
        )
    }
}

/// Search for `.config/mdexec.yaml` walking up from `start`
fn find_config_file(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start.ancestors().find_map(|dir| {
        let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    })
}

/// Load and parse a config file
fn load_config(config_path: &Utf8Path) -> Result<MdexecConfig> {
    let content = fs_err::read_to_string(config_path)?;

    facet_yaml::from_str(&content).map_err(|e| eyre!("Failed to parse {}: {}", config_path, e))
}
