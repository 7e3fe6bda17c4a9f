//! Demultiplex structured log lines from the runtime's stderr.
//!
//! Programs log by writing `[LOG:INFO] message`, `[LOG:WARN] message` or
//! `[LOG:ERROR] message` to stderr. Every other stderr line is passed through.

pub const LOG_PREFIX: &str = "[LOG:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `WARN` and `ERROR` map to their levels, anything else is info.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "WARN" => Self::Warn,
            "ERROR" => Self::Error,
            _ => Self::Info,
        }
    }

    /// Short tag used when forwarding.
    pub fn short(self) -> &'static str {
        match self {
            Self::Info => "INF",
            Self::Warn => "WRN",
            Self::Error => "ERR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Leveled { level: LogLevel, message: String },
    Passthrough(String),
}

/// Classify a single stderr line.
pub fn parse_line(line: &str) -> LogRecord {
    if !line.starts_with(LOG_PREFIX) {
        return LogRecord::Passthrough(line.to_string());
    }
    match line.split_once(']') {
        Some((header, message)) => LogRecord::Leveled {
            level: LogLevel::from_tag(header.replace(LOG_PREFIX, "").trim()),
            message: message.trim().to_string(),
        },
        None => LogRecord::Passthrough(format!("TS stderr: {line}")),
    }
}

/// Classify every line of captured stderr.
pub fn demux(stderr: &str) -> Vec<LogRecord> {
    stderr.lines().map(parse_line).collect()
}

/// Where demultiplexed records go.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
    fn passthrough(&self, line: &str);
}

/// Leveled records go to `tracing`, passthrough lines to our own stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        let tag = level.short();
        match level {
            LogLevel::Info => tracing::info!("TS,{tag}: {message}"),
            LogLevel::Warn => tracing::warn!("TS,{tag}: {message}"),
            LogLevel::Error => tracing::error!("TS,{tag}: {message}"),
        }
    }

    fn passthrough(&self, line: &str) {
        eprintln!("{line}");
    }
}

pub fn forward(records: &[LogRecord], sink: &dyn LogSink) {
    for record in records {
        match record {
            LogRecord::Leveled { level, message } => sink.log(*level, message),
            LogRecord::Passthrough(line) => sink.passthrough(line),
        }
    }
}
