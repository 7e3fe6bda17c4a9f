//! mdexec: render Markdown with executed TypeScript code blocks

mod commands;
mod config;

use std::env;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use facet::Facet;
use facet_args as args;
use owo_colors::OwoColorize;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ResolvedConfig;

/// Render a Markdown file to HTML
#[derive(Facet, Debug)]
struct RenderArgs {
    /// Markdown file to render
    #[facet(args::positional)]
    input: String,

    /// Write HTML here instead of stdout
    #[facet(args::named, args::short = 'o', default)]
    output: Option<String>,
}

/// Run a TypeScript program the way a code block would
#[derive(Facet, Debug)]
struct ExecArgs {
    /// Program file (reads stdin when omitted)
    #[facet(args::positional, default)]
    file: Option<String>,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum Command {
    /// Render a Markdown file to HTML
    Render(RenderArgs),
    /// Run a TypeScript program and print its result
    Exec(ExecArgs),
}

#[derive(Facet, Debug)]
struct Args {
    #[facet(args::subcommand)]
    command: Command,
}

fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let args_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    let parsed: Args = facet_args::from_slice(&args_refs).map_err(|e| {
        eprintln!("{:?}", miette::Report::new(e));
        "Failed to parse arguments".to_string()
    })?;

    Ok(parsed.command)
}

/// Logs go to stderr so rendered HTML can be piped from stdout.
fn init_tracing() {
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();
    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

async fn run(command: Command) -> eyre::Result<()> {
    let config = ResolvedConfig::discover()?;
    match config.config_path.as_ref() {
        Some(path) => tracing::debug!("Using {} (root {})", path, config.project_root()),
        None => tracing::debug!("No config file, root {}", config.project_root()),
    }

    match command {
        Command::Render(args) => {
            let input = Utf8PathBuf::from(args.input);
            let output = args.output.map(Utf8PathBuf::from);
            commands::render_file(&config, &input, output.as_deref()).await
        }
        Command::Exec(args) => {
            let file = args.file.map(Utf8PathBuf::from);
            commands::exec_code(&config, file.as_deref()).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("{}: {e}", "error".red().bold());
    }

    // Set up miette for nice error formatting
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))
    .ok();

    let command = match parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing();

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e:?}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}
