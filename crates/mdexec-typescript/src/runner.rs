//! The TypeScript formatter: invoke, forward logs, pick the result.

use std::future::Future;
use std::pin::Pin;

use mdexec_markdown::{CodeBlock, FenceOptions, Runner};
use tracing::Instrument;

use crate::Result;
use crate::config::RuntimeConfig;
use crate::invoker::{Invocation, Invoker};
use crate::logs::{LogSink, TracingSink, demux, forward};

pub const SESSION_WARNING: &str = "Sessions have not been implemented for TypeScript. \
     The block will fail if scoped definitions defined in other blocks are referenced.";

/// Per-block execution options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub session: Option<String>,
    pub id: Option<String>,
    /// Exit code that counts as success
    pub returncode: i32,
    pub workdir: Option<String>,
    pub width: Option<u16>,
}

impl From<&FenceOptions> for RunRequest {
    fn from(options: &FenceOptions) -> Self {
        Self {
            session: options.session.clone(),
            id: options.id.clone(),
            returncode: options.returncode,
            workdir: options.workdir.clone(),
            width: options.width,
        }
    }
}

/// What a failed run renders as: its stderr in a TypeScript code fence.
pub fn error_fragment(stderr: &str) -> String {
    format!("```typescript\n{stderr}\n```")
}

/// Runs TypeScript blocks through the configured runtime.
pub struct TypeScriptRunner<S = TracingSink> {
    invoker: Invoker,
    sink: S,
}

impl TypeScriptRunner {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            invoker: Invoker::new(config),
            sink: TracingSink,
        }
    }
}

impl<S: LogSink> TypeScriptRunner<S> {
    /// Send demultiplexed stderr somewhere other than `tracing`.
    pub fn with_sink<T: LogSink>(self, sink: T) -> TypeScriptRunner<T> {
        TypeScriptRunner {
            invoker: self.invoker,
            sink,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        self.invoker.config()
    }

    /// Run `code` and return stdout, or an error fragment built from stderr.
    pub async fn run_code(&self, code: &str, request: &RunRequest) -> Result<String> {
        if request.session.is_some() {
            tracing::warn!("{SESSION_WARNING}");
        }

        let output = self
            .invoker
            .invoke(&Invocation {
                code,
                workdir: request.workdir.as_deref(),
                width: request.width,
            })
            .await?;

        forward(&demux(&output.stderr), &self.sink);

        if !output.succeeded(request.returncode) {
            tracing::error!("TypeScript execution failed: {}", output.stderr);
            return Ok(error_fragment(&output.stderr));
        }
        Ok(output.stdout)
    }
}

impl<S: LogSink + 'static> Runner for TypeScriptRunner<S> {
    fn run<'a>(
        &'a self,
        block: &'a CodeBlock,
    ) -> Pin<Box<dyn Future<Output = mdexec_markdown::Result<String>> + Send + 'a>> {
        let request = RunRequest::from(&block.options);
        let span = tracing::debug_span!(
            "typescript",
            location = %block.location(),
            id = request.id.as_deref().unwrap_or("")
        );
        Box::pin(
            async move {
                self.run_code(&block.code, &request).await.map_err(|e| {
                    mdexec_markdown::Error::Execution {
                        language: block.language().to_string(),
                        message: e.to_string(),
                    }
                })
            }
            .instrument(span),
        )
    }
}
