use std::sync::Arc;

use camino::Utf8Path;
use eyre::Result;
use mdexec_markdown::{BoxedHandler, ExecHandler, RenderOptions, render};
use mdexec_typescript::{RunRequest, TypeScriptRunner};
use tokio::io::AsyncReadExt;

use crate::config::ResolvedConfig;

/// Render a Markdown file to HTML, executing TypeScript blocks on the way.
pub async fn render_file(
    config: &ResolvedConfig,
    input: &Utf8Path,
    output: Option<&Utf8Path>,
) -> Result<()> {
    let markdown = fs_err::read_to_string(input)?;
    let html = render_markdown(config, input.as_str(), &markdown).await?;

    match output {
        Some(path) => {
            fs_err::write(path, &html)?;
            tracing::info!("Wrote {}", path);
        }
        None => print!("{html}"),
    }
    Ok(())
}

pub async fn render_markdown(
    config: &ResolvedConfig,
    source_path: &str,
    markdown: &str,
) -> Result<String> {
    let runner = TypeScriptRunner::new(config.runtime_config());
    let languages = runner.config().languages.clone();
    let (source_tab, result_tab) = config.config.tabs();
    let handler: BoxedHandler = Arc::new(
        ExecHandler::new(runner)
            .with_enabled(config.config.enabled())
            .with_tabs(source_tab, result_tab),
    );

    let opts = RenderOptions::new()
        .with_source_path(source_path)
        .with_shared_handler(&languages, handler);
    let doc = render(markdown, &opts).await?;

    tracing::info!(
        "Rendered {} ({} code blocks, {} marked exec)",
        source_path,
        doc.code_blocks.len(),
        doc.code_blocks.iter().filter(|b| b.options.exec).count()
    );
    Ok(doc.html)
}

/// Run a TypeScript file (or stdin) and print what a block would show.
pub async fn exec_code(config: &ResolvedConfig, file: Option<&Utf8Path>) -> Result<()> {
    let code = match file {
        Some(path) => fs_err::read_to_string(path)?,
        None => {
            let mut code = String::new();
            tokio::io::stdin().read_to_string(&mut code).await?;
            code
        }
    };

    let runner = TypeScriptRunner::new(config.runtime_config());
    let output = runner.run_code(&code, &RunRequest::default()).await?;
    print!("{output}");
    Ok(())
}
