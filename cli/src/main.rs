use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use parsebench_core::{
    Checker, CommandProcessor, Corpus, FixtureName, HarnessConfig, Loader, RunContext, RunRecord, Sampler, Sequencer,
};
use tracing::{info, warn};

mod console;

use console::ConsoleSink;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "parsebench_core=info,parsebench=info";
const DEFAULT_CONFIG_FILE: &str = "parsebench.toml";

#[derive(Debug, Parser)]
#[command(
    name = "parsebench",
    author,
    version,
    about = "Benchmark and conformance harness for parsers",
    long_about = None
)]
struct CliArgs {
    /// Harness configuration (defaults to ./parsebench.toml when present)
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Processor command line, overriding `[processor].command`
    #[arg(long, value_name = "COMMAND", global = true)]
    processor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every catalog fixture and report sizes
    Load,
    /// Load fixtures, then benchmark the processor over them
    Bench {
        /// Only the quick subset
        #[arg(long)]
        quick: bool,
        /// Write a JSON run record to FILE
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },
    /// Compare processor output against an expectation corpus
    Check {
        #[arg(value_name = "CORPUS")]
        corpus: PathBuf,
    },
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var("PARSEBENCH_TRACE") {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    if let Some(path) = path {
        return HarnessConfig::load(path).with_context(|| format!("load config {}", path.display()));
    }
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        return HarnessConfig::load(default_path).with_context(|| format!("load config {}", DEFAULT_CONFIG_FILE));
    }
    Ok(HarnessConfig::default())
}

fn resolve_processor(config: &HarnessConfig, cli_override: Option<&str>) -> Result<CommandProcessor> {
    if let Some(command_line) = cli_override {
        return CommandProcessor::parse(command_line);
    }
    if config.processor.command.is_empty() {
        bail!("no processor configured; set [processor].command or pass --processor");
    }
    CommandProcessor::new(&config.processor.command)
}

async fn load_fixtures(config: &HarnessConfig, sink: &mut ConsoleSink) -> Result<RunContext> {
    let source = config.resource_source()?;
    let mut ctx = RunContext::new(config.catalog()?);
    let loader = Loader::new(config.loader_options());
    let report = loader.load_all(&mut ctx, source.as_ref(), sink).await;
    info!(
        loaded = report.loaded_count(),
        failed = report.failed_count(),
        total_bytes = report.total_bytes,
        "fixtures loaded"
    );
    Ok(ctx)
}

async fn run_load(config: &HarnessConfig) -> Result<()> {
    let mut sink = ConsoleSink::new();
    let ctx = load_fixtures(config, &mut sink).await?;
    print!("{}", console::render_table(sink.table(), ctx.catalog()));
    Ok(())
}

/// Drops fixtures that failed to load; their rows stay blank.
fn loaded_selection(ctx: &RunContext, requested: Vec<FixtureName>) -> Vec<FixtureName> {
    requested
        .into_iter()
        .filter(|name| {
            let loaded = ctx.loaded().contains(name);
            if !loaded {
                warn!(fixture = %name, "skipping benchmark of fixture that failed to load");
            }
            loaded
        })
        .collect()
}

async fn run_bench(config: &HarnessConfig, processor: &CommandProcessor, quick: bool, json: Option<&Path>) -> Result<()> {
    let mut sink = ConsoleSink::new();
    let mut ctx = load_fixtures(config, &mut sink).await?;

    let requested: Vec<FixtureName> = if quick {
        config.quick_selection()?
    } else {
        ctx.catalog().names().to_vec()
    };
    let selection = loaded_selection(&ctx, requested);
    if selection.is_empty() {
        bail!("no fixture loaded successfully; nothing to benchmark");
    }

    let mut sampler = Sampler::new(config.sampler_options());
    let sequencer = Sequencer::new(config.sequencer_options());
    let report = sequencer
        .run(&mut ctx, &selection, processor, &mut sampler, &mut sink)
        .await
        .with_context(|| format!("benchmark with '{}' aborted", processor.program()))?;
    info!(fixtures = report.events.len(), total_mean = report.total_mean, "benchmarks finished");

    print!("{}", console::render_table(sink.table(), ctx.catalog()));

    if let Some(path) = json {
        RunRecord::from_context(&ctx, Utc::now()).write_json(path)?;
        eprintln!("Run record written to {}", path.display());
    }
    Ok(())
}

fn run_check(config: &HarnessConfig, processor: &CommandProcessor, corpus_path: &Path) -> Result<()> {
    let corpus = Corpus::load(corpus_path)?;
    let checker = Checker::new(processor).with_focus(config.checker.focus.clone());
    let report = checker.run_corpus(&corpus);
    print!("{}", console::render_check_report(&report));
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    maybe_init_tracing();

    let CliArgs {
        config,
        processor,
        command,
    } = CliArgs::parse();
    let config = load_config(config.as_deref())?;

    match command {
        Commands::Load => run_load(&config).await,
        Commands::Bench { quick, json } => {
            let processor = resolve_processor(&config, processor.as_deref())?;
            run_bench(&config, &processor, quick, json.as_deref()).await
        }
        Commands::Check { corpus } => {
            let processor = resolve_processor(&config, processor.as_deref())?;
            run_check(&config, &processor, &corpus)
        }
    }
}
