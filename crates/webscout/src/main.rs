//! The `webscout` command line program.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::{self, Write as _};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream};
use tokio::io::BufReader;
use webscout::SessionBuilder;
use webscout::config::{Args, RunConfig};
use webscout::tools::Toolbox;
use webscout_anthropic_model::AnthropicProvider;

#[derive(Clone, Default)]
struct Spinner {
    bar: Arc<Mutex<Option<ProgressBar>>>,
}

impl Spinner {
    fn start(&self, message: &str) {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        bar.set_message(message.to_owned());
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut current) = self.bar.lock() {
            if let Some(old) = current.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn set_message(&self, message: String) {
        if let Ok(current) = self.bar.lock() {
            if let Some(bar) = current.as_ref() {
                bar.set_message(message);
            }
        }
    }

    fn stop(&self) {
        if let Ok(mut current) = self.bar.lock() {
            if let Some(bar) = current.take() {
                bar.finish_and_clear();
            }
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // A missing `.env` is fine, the real environment may have everything.
    if let Err(err) = dotenvy::dotenv() {
        debug!("no .env loaded: {err}");
    }

    // Exits with status 2 on usage errors.
    let args = Args::parse();

    let resolved = match RunConfig::resolve(args, |name| env::var(name).ok()) {
        Ok(resolved) => resolved,
        Err(err) => {
            print_error(&err);
            return ExitCode::FAILURE;
        }
    };
    for warning in &resolved.warnings {
        eprintln!(
            "{} {warning}",
            "warning:".if_supports_color(Stream::Stderr, |text| text.yellow())
        );
    }
    let config = resolved.config;
    debug!("resolved config: {config:?}");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            print_error(&err);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(config: RunConfig) -> Result<()> {
    let toolbox = Toolbox::provision(config.mcp_server().as_ref()).await?;

    let spinner = Spinner::default();
    let mut builder = SessionBuilder::with_model_provider(AnthropicProvider::new(
        config.anthropic_config(),
    ))
    .with_tools(toolbox.tools().iter().cloned())
    .on_thinking({
        let spinner = spinner.clone();
        move || spinner.start("Thinking...")
    })
    .on_tool_call({
        let spinner = spinner.clone();
        move |name| spinner.set_message(format!("Calling {name}..."))
    })
    .on_idle({
        let spinner = spinner.clone();
        move || spinner.stop()
    });
    if let Some(path) = config.report_path() {
        builder = builder.save_report_to(path, config.report_metadata());
    }
    let mut session = builder.build();

    let mut stdout = io::stdout();
    let result = match config.question() {
        Some(question) => session.run_one_shot(question, &mut stdout).await,
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            session.run_interactive(stdin, &mut stdout).await
        }
    };
    spinner.stop();
    if let Err(err) = stdout.flush() {
        warn!("failed to flush stdout: {err}");
    }

    // The server goes away on every path, the chat result wins.
    if let Err(err) = toolbox.shutdown().await {
        warn!("{err:#}");
    }
    result
}

fn print_error(err: &dyn std::fmt::Display) {
    eprintln!(
        "{} {err}",
        "error:".if_supports_color(Stream::Stderr, |text| text.red())
    );
}
