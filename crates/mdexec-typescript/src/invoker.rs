//! Run the runtime with the code on stdin and capture its streams.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::RuntimeConfig;
use crate::{Error, Result};

/// Captured result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// Whether the process exited with `expected`.
    pub fn succeeded(&self, expected: i32) -> bool {
        self.exit_code == Some(expected)
    }
}

/// What to run and where.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invocation<'a> {
    pub code: &'a str,
    /// Directory relative to the project root
    pub workdir: Option<&'a str>,
    /// Exposed to the program as `COLUMNS`
    pub width: Option<u16>,
}

/// Builds the command line and runs it.
#[derive(Debug, Clone)]
pub struct Invoker {
    config: RuntimeConfig,
}

impl Invoker {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Project root joined with `workdir`, as an absolute path.
    pub fn base_dir(&self, workdir: Option<&str>) -> Result<PathBuf> {
        let root = match &self.config.project_root {
            Some(root) => std::path::absolute(root)?,
            None => std::env::current_dir()?,
        };
        Ok(match workdir {
            Some(dir) => root.join(dir),
            None => root,
        })
    }

    /// Prepend an import of the prelude if `base_dir` has one.
    pub fn prepare_code(&self, code: &str, base_dir: &Path) -> String {
        let prelude = base_dir.join(&self.config.prelude);
        if !prelude.is_file() {
            return code.to_string();
        }
        tracing::debug!("Importing prelude {}", prelude.display());
        let specifier = prelude
            .display()
            .to_string()
            .replace('\\', "\\\\")
            .replace('"', "\\\"");
        format!("import \"{specifier}\";\n{code}")
    }

    /// Run the runtime to completion with `invocation.code` on stdin.
    pub async fn invoke(&self, invocation: &Invocation<'_>) -> Result<ProcessOutput> {
        let start_time = Instant::now();
        let base_dir = self.base_dir(invocation.workdir)?;
        let code = self.prepare_code(invocation.code, &base_dir);

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .current_dir(&base_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(width) = invocation.width {
            cmd.env("COLUMNS", width.to_string());
        }

        tracing::debug!(
            "Starting: {} (in {})",
            self.config.command_line(),
            base_dir.display()
        );

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            command: self.config.command.clone(),
            source,
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::StdinUnavailable(self.config.command.clone()))?;

        // Feed stdin while draining stdout/stderr so neither side blocks on a full pipe
        let write = async move {
            let result = stdin.write_all(code.as_bytes()).await;
            drop(stdin);
            result
        };
        let (written, output) = tokio::time::timeout(self.config.timeout, async {
            tokio::join!(write, child.wait_with_output())
        })
        .await
        .map_err(|_| {
            tracing::warn!(
                "TIMEOUT after {:?}: {}",
                self.config.timeout,
                self.config.command_line()
            );
            Error::Timeout(self.config.timeout)
        })?;

        match written {
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!("Runtime closed stdin before reading all code");
            }
            Err(e) => return Err(e.into()),
            Ok(()) => {}
        }
        let output = output?;

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start_time.elapsed(),
        };

        tracing::debug!(
            "Finished in {}ms, exit={:?}, stdout={}B, stderr={}B",
            result.duration.as_millis(),
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}
