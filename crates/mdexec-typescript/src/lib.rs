//! TypeScript execution for mdexec
//!
//! Code blocks are piped to an external runtime (`bun --silent run -` by
//! default). Standard output becomes the block's result; standard error is
//! scanned for `[LOG:<LEVEL>] message` lines which are forwarded to the
//! logger, everything else on stderr is passed through.

mod config;
mod invoker;
mod logs;
mod runner;

pub use config::{
    DEFAULT_ARGS, DEFAULT_COMMAND, DEFAULT_LANGUAGES, DEFAULT_PRELUDE, DEFAULT_TIMEOUT_SECS,
    RuntimeConfig,
};
pub use invoker::{Invocation, Invoker, ProcessOutput};
pub use logs::{LOG_PREFIX, LogLevel, LogRecord, LogSink, TracingSink, demux, forward, parse_line};
pub use runner::{RunRequest, SESSION_WARNING, TypeScriptRunner, error_fragment};

use std::time::Duration;

/// Errors that can occur while running a TypeScript block.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The runtime could not be started (usually: not installed).
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// The process did not finish in time and was killed.
    #[error("process timed out after {0:?}")]
    Timeout(Duration),

    /// The child's stdin was not captured.
    #[error("stdin of `{0}` was not captured")]
    StdinUnavailable(String),

    /// I/O error while talking to the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for TypeScript execution.
pub type Result<T> = std::result::Result<T, Error>;
