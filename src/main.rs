use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipeview::buffer::Buffer;
use pipeview::config::PipelineConfig;
use pipeview::executor::ShellExecutor;
use pipeview::pipeline::{Pipeline, PipelineBuilder};
use pipeview::tui::TuiView;

/// Step through a text pipeline one stage at a time.
#[derive(Parser, Debug)]
#[command(name = "pipeview", version, about)]
struct Cli {
    /// Pipeline config (YAML). Defaults to `cat | grep error | sort | uniq -c`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs here. The terminal belongs to the UI, so there is no
    /// log output without this.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Bytes kept from each stage's output (one is reserved).
    #[arg(long)]
    capture_limit: Option<usize>,

    /// Hand input to stages through this file instead of a pipe.
    #[arg(long)]
    staging_file: Option<PathBuf>,

    /// Validate the config, print the stage plan, and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pipeview: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    init_tracing(cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(limit) = cli.capture_limit {
        config.capture_limit = limit;
    }
    if let Some(path) = cli.staging_file {
        config.staging_file = Some(path);
    }
    config.validate()?;

    let pipeline = PipelineBuilder::from_config(&config)
        .build()
        .map_err(anyhow::Error::msg)?;

    if cli.check {
        print_plan(&pipeline, &config);
        return Ok(ExitCode::SUCCESS);
    }

    let seed = Buffer::seed(&config.seed, config.capture_limit);
    let mut executor = match &config.staging_file {
        Some(path) => ShellExecutor::with_staging_file(config.capture_limit, path.clone()),
        None => ShellExecutor::new(config.capture_limit),
    };
    info!(
        stages = pipeline.len(),
        capture_limit = config.capture_limit,
        staging_file = ?executor.staging_file(),
        "starting"
    );

    // The view restores the terminal when this block ends, halted or not.
    let outcome = {
        let mut view = TuiView::enter().context("failed to start terminal UI")?;
        pipeline.run(seed, &mut executor, &mut view).await?
    };
    // Removes the staging file, if any.
    drop(executor);

    eprintln!("{}", outcome.summary());
    Ok(ExitCode::from(outcome.exit_code()))
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_plan(pipeline: &Pipeline, config: &PipelineConfig) {
    println!(
        "{} stages, capture limit {} bytes, input via {}",
        pipeline.len(),
        config.capture_limit,
        match &config.staging_file {
            Some(path) => format!("staging file {}", path.display()),
            None => "stdin pipe".to_string(),
        }
    );
    for stage in pipeline.stages() {
        println!("  {}. {:<20} {}", stage.index + 1, stage.label, stage.command);
    }
}
