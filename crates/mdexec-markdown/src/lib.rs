//! # mdexec-markdown
//!
//! Markdown rendering with pluggable code block handlers, including handlers
//! that execute the block and inject its output into the page.
//!
//! - **Fence options**: `typescript exec="yes" html="1" source="above"` info
//!   strings are parsed into [`FenceOptions`]
//! - **Code blocks**: dispatched to a [`CodeBlockHandler`] per language
//! - **Execution**: [`ExecHandler`] runs a block through a [`Runner`] and
//!   formats the captured output
//!
//! ## Example
//!
//! ```text
//! use mdexec_markdown::{render, ExecHandler, RenderOptions};
//!
//! let opts = RenderOptions::new().with_handler("typescript", ExecHandler::new(runner));
//! let doc = render("```typescript exec=\"1\"\nconsole.log('hi')\n```", &opts).await?;
//!
//! println!("HTML: {}", doc.html);
//! ```

mod exec;
mod fence;
mod handler;
mod render;

pub use exec::{ExecHandler, NO_EXEC_ENV, Runner, SourceLocation};
pub use fence::{FenceOptions, is_truthy};
pub use handler::{BoxedHandler, CodeBlock, CodeBlockHandler, RawCodeHandler, code_block_html};
pub use render::{Document, RenderOptions, markdown_to_html, render};

/// Error type for mdexec-markdown operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A fence option had a value that cannot be used
    #[error("invalid value for fence option `{key}` on line {line}: {value:?}")]
    InvalidOption {
        key: String,
        value: String,
        line: usize,
    },

    /// The `source` option named a location we cannot render
    #[error("unsupported location for sources: {0}")]
    UnsupportedSource(String),

    /// A runner could not execute a block
    #[error("execution failed for language '{language}': {message}")]
    Execution { language: String, message: String },
}

/// Result type alias for mdexec-markdown operations.
pub type Result<T> = std::result::Result<T, Error>;
