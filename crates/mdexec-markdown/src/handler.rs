//! Code block handler trait and utilities.
//!
//! This module provides the [`CodeBlockHandler`] trait for implementing
//! custom code block rendering (execution, highlighting, etc.)

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::Result;
use crate::fence::FenceOptions;

/// A fenced (or indented) code block found while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Source file the block came from, if known
    pub source_path: Option<String>,
    /// 1-based line of the opening fence
    pub line: usize,
    /// Parsed info string
    pub options: FenceOptions,
    /// The raw code content
    pub code: String,
}

impl CodeBlock {
    /// The block language (empty for indented blocks)
    pub fn language(&self) -> &str {
        &self.options.language
    }

    /// `path:line` for log messages
    pub fn location(&self) -> String {
        format!(
            "{}:{}",
            self.source_path.as_deref().unwrap_or("<input>"),
            self.line
        )
    }
}

/// A handler for rendering code blocks.
///
/// Implementations can run the code, highlight it, render diagrams,
/// or perform any other transformation of code block content.
///
/// # Example
///
/// ```rust,ignore
/// use mdexec_markdown::{CodeBlock, CodeBlockHandler, Result};
///
/// struct ShoutHandler;
///
/// impl CodeBlockHandler for ShoutHandler {
///     fn render<'a>(
///         &'a self,
///         block: &'a CodeBlock,
///     ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
///         Box::pin(async move { Ok(format!("<p>{}</p>", block.code.to_uppercase())) })
///     }
/// }
/// ```
pub trait CodeBlockHandler: Send + Sync {
    /// Render a code block to HTML.
    fn render<'a>(
        &'a self,
        block: &'a CodeBlock,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Type alias for a boxed code block handler.
pub type BoxedHandler = Arc<dyn CodeBlockHandler>;

/// A simple handler that wraps code in `<pre><code>` tags without processing.
///
/// This is used as a fallback when no handler is registered for a language.
pub struct RawCodeHandler;

impl CodeBlockHandler for RawCodeHandler {
    fn render<'a>(
        &'a self,
        block: &'a CodeBlock,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move { Ok(code_block_html(block.language(), &block.code)) })
    }
}

/// Render `code` as an escaped `<pre><code>` block tagged with `language`.
pub fn code_block_html(language: &str, code: &str) -> String {
    let lang_class = if language.is_empty() {
        String::new()
    } else {
        format!(
            " class=\"language-{}\"",
            html_escape::encode_double_quoted_attribute(language)
        )
    };
    format!(
        "<pre><code{}>{}</code></pre>\n",
        lang_class,
        html_escape::encode_text(code)
    )
}
