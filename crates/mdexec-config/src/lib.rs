//! Shared configuration types for mdexec
//!
//! This crate contains types that are shared between:
//! - The `mdexec` binary (for `.config/mdexec.yaml` parsing)
//! - The runners, which turn them into their runtime settings

use facet::Facet;

/// Configuration file name, looked up inside `.config/`
pub const CONFIG_FILE: &str = "mdexec.yaml";

/// Default tab titles for `tabbed-left` / `tabbed-right` sources
pub const DEFAULT_TABS: (&str, &str) = ("Source", "Result");

/// mdexec configuration from `.config/mdexec.yaml`
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "snake_case")]
pub struct MdexecConfig {
    /// Enable/disable execution of `exec` blocks
    #[facet(default)]
    pub enabled: Option<bool>,

    /// Project root override (relative to the directory holding `.config/`)
    #[facet(default)]
    pub project_root: Option<String>,

    /// Source / result tab titles
    #[facet(default)]
    pub tabs: Option<Vec<String>>,

    /// TypeScript runner configuration
    #[facet(default)]
    pub typescript: Option<TypeScriptConfig>,
}

impl MdexecConfig {
    /// Whether execution is enabled, defaulting to `true`
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Tab titles, falling back to [`DEFAULT_TABS`] unless exactly two are given
    pub fn tabs(&self) -> (String, String) {
        match self.tabs.as_deref() {
            Some([source, result]) => (source.clone(), result.clone()),
            _ => (DEFAULT_TABS.0.to_string(), DEFAULT_TABS.1.to_string()),
        }
    }

    /// TypeScript section, or an all-defaults one
    pub fn typescript(&self) -> TypeScriptConfig {
        self.typescript.clone().unwrap_or_default()
    }
}

/// TypeScript runner configuration
///
/// ```yaml
/// typescript:
///   command: bun
///   args: [--silent, run, "-"]
///   prelude: mexec-prelude.ts
///   timeout_secs: 30
///   languages: [typescript, ts]
/// ```
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "snake_case")]
pub struct TypeScriptConfig {
    /// Runtime executable
    #[facet(default)]
    pub command: Option<String>,

    /// Arguments making the runtime read a program from stdin
    #[facet(default)]
    pub args: Option<Vec<String>>,

    /// Prelude file name, relative to the block's base directory
    #[facet(default)]
    pub prelude: Option<String>,

    /// Execution timeout in seconds
    #[facet(default)]
    pub timeout_secs: Option<u64>,

    /// Fence languages routed to the TypeScript runner
    #[facet(default)]
    pub languages: Option<Vec<String>>,
}
