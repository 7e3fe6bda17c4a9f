//! Execute code blocks and inject their output.
//!
//! [`ExecHandler`] is the language-independent half of execution: it decides
//! whether a block runs, hands it to a [`Runner`], and places the output
//! (and optionally the source) into the page.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use crate::handler::{CodeBlock, CodeBlockHandler, code_block_html};
use crate::render::markdown_to_html;
use crate::{Error, Result};

/// Setting this environment variable disables execution everywhere.
pub const NO_EXEC_ENV: &str = "MDEXEC_NO_EXEC";

/// Runs the code of a block and returns what should be shown for it.
///
/// The returned string is Markdown unless the block asks for `html` or a
/// `result` language.
pub trait Runner: Send + Sync {
    /// Execute `block.code` with the block's options.
    fn run<'a>(
        &'a self,
        block: &'a CodeBlock,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Where the source is shown relative to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLocation {
    Above,
    Below,
    MaterialBlock,
    TabbedLeft,
    TabbedRight,
    Console,
}

impl FromStr for SourceLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "above" => Self::Above,
            "below" => Self::Below,
            "material-block" => Self::MaterialBlock,
            "tabbed-left" => Self::TabbedLeft,
            "tabbed-right" => Self::TabbedRight,
            "console" => Self::Console,
            other => return Err(Error::UnsupportedSource(other.to_string())),
        })
    }
}

/// Code block handler that executes blocks marked `exec`.
pub struct ExecHandler<R> {
    runner: R,
    enabled: bool,
    tabs: (String, String),
}

impl<R: Runner> ExecHandler<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            enabled: true,
            tabs: ("Source".to_string(), "Result".to_string()),
        }
    }

    /// Turn execution off; `exec` blocks then render as plain code.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Default tab titles for tabbed sources.
    pub fn with_tabs(mut self, source: impl Into<String>, result: impl Into<String>) -> Self {
        self.tabs = (source.into(), result.into());
        self
    }

    fn should_execute(&self, block: &CodeBlock, no_exec: bool) -> bool {
        block.options.exec && self.enabled && !no_exec
    }

    /// `no_exec` mirrors [`NO_EXEC_ENV`] being set.
    async fn render_block(&self, block: &CodeBlock, no_exec: bool) -> Result<String> {
        if !self.should_execute(block, no_exec) {
            return Ok(code_block_html(block.language(), &block.code));
        }
        tracing::debug!("Executing {} block at {}", block.language(), block.location());
        self.format(block).await
    }

    async fn format(&self, block: &CodeBlock) -> Result<String> {
        let options = &block.options;

        let output = match self.runner.run(block).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Execution of {} failed: {}", block.location(), e);
                return Ok(code_block_html(block.language(), &e.to_string()));
            }
        };

        if output.is_empty() && options.source.is_none() {
            return Ok(String::new());
        }

        let rendered = if options.html {
            output.clone()
        } else if let Some(result) = &options.result {
            code_block_html(result, &output)
        } else {
            markdown_to_html(&output)
        };

        let Some(location) = options.source else {
            return Ok(rendered);
        };

        let source = code_block_html(block.language(), &block.code);
        let (source_title, result_title) = options.tabs.as_ref().unwrap_or(&self.tabs);

        Ok(match location {
            SourceLocation::Above => format!("{source}{rendered}"),
            SourceLocation::Below => format!("{rendered}{source}"),
            SourceLocation::MaterialBlock => {
                format!("{source}<div class=\"result\">\n{rendered}</div>\n")
            }
            SourceLocation::TabbedLeft => {
                tabbed(&[(source_title, &source), (result_title, &rendered)])
            }
            SourceLocation::TabbedRight => {
                tabbed(&[(result_title, &rendered), (source_title, &source)])
            }
            SourceLocation::Console => {
                let language = options.result.as_deref().unwrap_or(block.language());
                code_block_html(language, &format!("{}\n{}", block.code.trim_end(), output))
            }
        })
    }
}

impl<R: Runner + 'static> CodeBlockHandler for ExecHandler<R> {
    fn render<'a>(
        &'a self,
        block: &'a CodeBlock,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.render_block(block, std::env::var_os(NO_EXEC_ENV).is_some()))
    }
}

fn tabbed(tabs: &[(&String, &String)]) -> String {
    let mut html = format!("<div class=\"tabbed-set\" data-tabs=\"{}\">\n", tabs.len());
    for (title, content) in tabs {
        html.push_str(&format!(
            "<div class=\"tabbed-block\">\n<div class=\"tabbed-label\">{}</div>\n{}</div>\n",
            html_escape::encode_text(title.as_str()),
            content
        ));
    }
    html.push_str("</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fence::FenceOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes a fixed output, or fails with a fixed message.
    struct FixedRunner(std::result::Result<&'static str, &'static str>);

    impl Runner for FixedRunner {
        fn run<'a>(
            &'a self,
            block: &'a CodeBlock,
        ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
            Box::pin(async move {
                match self.0 {
                    Ok(out) => Ok(out.to_string()),
                    Err(message) => Err(Error::Execution {
                        language: block.language().to_string(),
                        message: message.to_string(),
                    }),
                }
            })
        }
    }

    fn block(info: &str, code: &str) -> CodeBlock {
        CodeBlock {
            source_path: None,
            line: 1,
            options: FenceOptions::parse(info, 1).unwrap(),
            code: code.to_string(),
        }
    }

    async fn render_with(output: &'static str, info: &str, code: &str) -> String {
        ExecHandler::new(FixedRunner(Ok(output)))
            .render(&block(info, code))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_output_markdown() {
        let html = render_with("**Bold!**\n", r#"typescript exec="yes""#, "").await;
        assert_eq!(html, "<p><strong>Bold!</strong></p>\n");
    }

    #[tokio::test]
    async fn test_output_html() {
        let html = render_with("**Bold!**\n", r#"typescript exec="yes" html="yes""#, "").await;
        assert_eq!(html, "**Bold!**\n");
    }

    #[tokio::test]
    async fn test_output_result_block() {
        let html = render_with("a < b\n", r#"typescript exec="1" result="text""#, "").await;
        assert_eq!(
            html,
            "<pre><code class=\"language-text\">a &lt; b\n</code></pre>\n"
        );
    }

    #[tokio::test]
    async fn test_not_executed_without_exec() {
        let html = render_with("never\n", "typescript", "let x = 1;").await;
        assert!(!html.contains("never"));
        assert!(html.contains("let x = 1;"));
    }

    #[tokio::test]
    async fn test_disabled_handler_renders_code() {
        let handler = ExecHandler::new(FixedRunner(Ok("never"))).with_enabled(false);
        let html = handler
            .render(&block(r#"typescript exec="1""#, "let x = 1;"))
            .await
            .unwrap();
        assert!(!html.contains("never"));
        assert!(html.contains("let x = 1;"));
    }

    /// Counts how often it was asked to run.
    #[derive(Default)]
    struct CountingRunner(AtomicUsize);

    impl Runner for CountingRunner {
        fn run<'a>(
            &'a self,
            _block: &'a CodeBlock,
        ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok("ran\n".to_string()) })
        }
    }

    #[tokio::test]
    async fn test_no_exec_switch_skips_runner() {
        let handler = ExecHandler::new(CountingRunner::default());
        let exec_block = block(r#"typescript exec="1""#, "let x = 1;");

        let html = handler.render_block(&exec_block, true).await.unwrap();
        assert_eq!(
            html,
            "<pre><code class=\"language-typescript\">let x = 1;</code></pre>\n"
        );
        assert_eq!(handler.runner.0.load(Ordering::SeqCst), 0);

        let html = handler.render_block(&exec_block, false).await.unwrap();
        assert_eq!(html, "<p>ran</p>\n");
        assert_eq!(handler.runner.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_output_without_source() {
        let html = render_with("", r#"typescript exec="1""#, "const a = 1;").await;
        assert_eq!(html, "");
    }

    #[tokio::test]
    async fn test_source_above_and_below() {
        let above = render_with("out\n", r#"ts exec="1" source="above""#, "src").await;
        assert!(above.find("src").unwrap() < above.find("<p>out</p>").unwrap());

        let below = render_with("out\n", r#"ts exec="1" source="below""#, "src").await;
        assert!(below.find("<p>out</p>").unwrap() < below.find("src").unwrap());
    }

    #[tokio::test]
    async fn test_source_shown_even_without_output() {
        let html = render_with("", r#"ts exec="1" source="above""#, "quiet()").await;
        assert!(html.contains("quiet()"));
    }

    #[tokio::test]
    async fn test_material_block() {
        let html = render_with("out\n", r#"ts exec="1" source="material-block""#, "src").await;
        assert!(html.starts_with("<pre><code class=\"language-ts\">src</code></pre>"));
        assert!(html.contains("<div class=\"result\">\n<p>out</p>\n</div>"));
    }

    #[tokio::test]
    async fn test_tabbed_sources() {
        let left = render_with("out\n", r#"ts exec="1" source="tabbed-left""#, "src").await;
        assert!(left.find(">Source<").unwrap() < left.find(">Result<").unwrap());

        let right = render_with(
            "out\n",
            r#"ts exec="1" source="tabbed-right" tabs="Code|Output""#,
            "src",
        )
        .await;
        assert!(right.find(">Output<").unwrap() < right.find(">Code<").unwrap());
    }

    #[tokio::test]
    async fn test_handler_default_tabs() {
        let handler = ExecHandler::new(FixedRunner(Ok("out"))).with_tabs("In", "Out");
        let html = handler
            .render(&block(r#"ts exec="1" source="tabbed-left""#, "src"))
            .await
            .unwrap();
        assert!(html.contains(">In<"));
        assert!(html.contains(">Out<"));
    }

    #[tokio::test]
    async fn test_console_source() {
        let html = render_with("ok\n", r#"typescript exec="1" source="console""#, ">>> console.log(\"ok\")\n").await;
        assert_eq!(
            html,
            "<pre><code class=\"language-typescript\">&gt;&gt;&gt; console.log(\"ok\")\nok\n</code></pre>\n"
        );
    }

    #[tokio::test]
    async fn test_runner_error_is_rendered() {
        let handler = ExecHandler::new(FixedRunner(Err("bun: not found")));
        let html = handler
            .render(&block(r#"typescript exec="1""#, "x"))
            .await
            .unwrap();
        assert!(html.starts_with("<pre><code class=\"language-typescript\">"));
        assert!(html.contains("bun: not found"));
    }

    #[test]
    fn test_source_location_parse() {
        assert_eq!("above".parse::<SourceLocation>().unwrap(), SourceLocation::Above);
        assert_eq!(
            "tabbed-right".parse::<SourceLocation>().unwrap(),
            SourceLocation::TabbedRight
        );
        let err = "sideways".parse::<SourceLocation>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported location for sources: sideways");
    }
}
