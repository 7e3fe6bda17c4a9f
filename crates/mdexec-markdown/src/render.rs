//! Main rendering pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::Result;
use crate::fence::FenceOptions;
use crate::handler::{BoxedHandler, CodeBlock, CodeBlockHandler, RawCodeHandler};

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Options for rendering markdown.
#[derive(Default)]
pub struct RenderOptions {
    /// Source file path (for log messages)
    pub source_path: Option<String>,

    /// Code block handlers keyed by language
    pub code_handlers: HashMap<String, BoxedHandler>,

    /// Default handler for languages without a specific handler
    pub default_handler: Option<BoxedHandler>,
}

impl RenderOptions {
    /// Create new render options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source path used in log messages.
    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Register a handler for a specific language.
    pub fn with_handler<H: CodeBlockHandler + 'static>(
        mut self,
        language: &str,
        handler: H,
    ) -> Self {
        self.code_handlers
            .insert(language.to_string(), Arc::new(handler));
        self
    }

    /// Register one shared handler for several languages.
    pub fn with_shared_handler<S: AsRef<str>>(
        mut self,
        languages: &[S],
        handler: BoxedHandler,
    ) -> Self {
        for language in languages {
            self.code_handlers
                .insert(language.as_ref().to_string(), handler.clone());
        }
        self
    }

    /// Set the default handler for unregistered languages.
    pub fn with_default_handler<H: CodeBlockHandler + 'static>(mut self, handler: H) -> Self {
        self.default_handler = Some(Arc::new(handler));
        self
    }
}

/// A rendered markdown document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Rendered HTML content
    pub html: String,

    /// Code blocks found in the document, in order
    pub code_blocks: Vec<CodeBlock>,
}

/// Render markdown to HTML, passing every code block through its handler.
///
/// # Example
///
/// ```rust,ignore
/// use mdexec_markdown::{render, RenderOptions};
///
/// let doc = render("# World\n\nSome content.", &RenderOptions::default()).await?;
/// println!("{}", doc.html);
/// ```
pub async fn render(markdown: &str, options: &RenderOptions) -> Result<Document> {
    let parser = Parser::new_ext(markdown, parser_options()).into_offset_iter();

    // Collect events, noting code blocks for processing
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut code_blocks: Vec<(usize, CodeBlock)> = Vec::new(); // (event index, block)
    let mut in_code_block = false;

    for (event, range) in parser {
        match &event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let line = markdown[..range.start].matches('\n').count() + 1;
                let fence_options = match kind {
                    CodeBlockKind::Fenced(info) => FenceOptions::parse(info, line)?,
                    CodeBlockKind::Indented => FenceOptions::default(),
                };
                // Mark position for later replacement
                code_blocks.push((
                    events.len(),
                    CodeBlock {
                        source_path: options.source_path.clone(),
                        line,
                        options: fence_options,
                        code: String::new(),
                    },
                ));
                in_code_block = true;
            }
            Event::Text(text) if in_code_block => {
                if let Some((_, block)) = code_blocks.last_mut() {
                    block.code.push_str(text);
                }
                continue; // Don't add text event, we'll replace the whole block
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
            }
            _ => {}
        }
        events.push(event);
    }

    // Process code blocks with handlers
    let fallback: BoxedHandler = Arc::new(RawCodeHandler);

    let mut rendered_blocks: HashMap<usize, String> = HashMap::new();

    for (idx, block) in &code_blocks {
        let handler = options
            .code_handlers
            .get(block.language())
            .or(options.default_handler.as_ref())
            .unwrap_or(&fallback);

        let rendered = handler.render(block).await?;
        rendered_blocks.insert(*idx, rendered);
    }

    // Generate final HTML. Runs of ordinary events go through one writer so
    // table and list state survive between events.
    let mut html = String::new();
    let mut pending: Vec<Event<'_>> = Vec::new();
    let mut skip_until_code_block_end = false;

    for (idx, event) in events.into_iter().enumerate() {
        // Check if this is a code block start we need to replace
        if let Some(rendered) = rendered_blocks.get(&idx) {
            pulldown_cmark::html::push_html(&mut html, pending.drain(..));
            html.push_str(rendered);
            skip_until_code_block_end = true;
            continue;
        }

        if skip_until_code_block_end {
            if matches!(event, Event::End(TagEnd::CodeBlock)) {
                skip_until_code_block_end = false;
            }
            continue;
        }

        pending.push(event);
    }
    pulldown_cmark::html::push_html(&mut html, pending.into_iter());

    Ok(Document {
        html,
        code_blocks: code_blocks.into_iter().map(|(_, block)| block).collect(),
    })
}

/// Render markdown to HTML without any code block handlers.
///
/// Used to turn program output into HTML, so it never executes anything.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, Parser::new_ext(markdown, parser_options()));
    html
}
