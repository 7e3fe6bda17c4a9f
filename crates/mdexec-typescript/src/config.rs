//! Runtime settings for the TypeScript runner.

use std::path::PathBuf;
use std::time::Duration;

use mdexec_config::TypeScriptConfig;

pub const DEFAULT_COMMAND: &str = "bun";
pub const DEFAULT_ARGS: &[&str] = &["--silent", "run", "-"];
pub const DEFAULT_PRELUDE: &str = "mexec-prelude.ts";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LANGUAGES: &[&str] = &["typescript", "ts"];

/// Runtime configuration for the TypeScript runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Runtime executable
    pub command: String,
    /// Arguments making the runtime read the program from stdin
    pub args: Vec<String>,
    /// Prelude file name, looked up in the block's base directory
    pub prelude: String,
    /// Kill the process after this long
    pub timeout: Duration,
    /// Project root; `None` means the current directory at run time
    pub project_root: Option<PathBuf>,
    /// Fence languages handled by this runner
    pub languages: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            args: DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            prelude: DEFAULT_PRELUDE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            project_root: None,
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RuntimeConfig {
    /// Create from the config file section, applying defaults for unspecified values
    pub fn from_config(config: &TypeScriptConfig, project_root: Option<PathBuf>) -> Self {
        let defaults = Self::default();

        Self {
            command: config.command.clone().unwrap_or(defaults.command),
            args: config.args.clone().unwrap_or(defaults.args),
            prelude: config.prelude.clone().unwrap_or(defaults.prelude),
            timeout: config
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            project_root,
            languages: config.languages.clone().unwrap_or(defaults.languages),
        }
    }

    /// The command line, for log messages
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
