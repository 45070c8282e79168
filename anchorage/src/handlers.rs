use anchorage_core::{
    CheckConfig, Checker, MemoryGraph, ReportEvent, ReportSink, Reporter, Tally, TapRenderer,
    name_filter,
};
use anchorage_scanner::ProgressCallback;
use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// How the report stream is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tap,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tap" => Ok(OutputFormat::Tap),
            "json" => Ok(OutputFormat::Json),
            _ => bail!("Unknown report format '{}'", s),
        }
    }
}

/// Load the asset graph, expanding `~` in the path.
pub fn load_graph(path: &str, pretty_urls: bool) -> Result<MemoryGraph> {
    let expanded = shellexpand::tilde(path);
    let graph_path = Path::new(expanded.as_ref());
    if !graph_path.exists() {
        bail!("Graph file {} does not exist", graph_path.display());
    }
    let graph = MemoryGraph::load(graph_path)
        .with_context(|| format!("Failed to load graph from {}", graph_path.display()))?;
    Ok(graph.with_pretty_urls(pretty_urls))
}

/// Map the `check` subcommand's flags onto a configuration.
pub fn build_config(args: &ArgMatches) -> Result<CheckConfig> {
    let root = args
        .get_one::<Url>("root")
        .context("--root is required")?
        .clone();
    let concurrency = *args.get_one::<usize>("concurrency").unwrap_or(&20);
    let population_concurrency = *args
        .get_one::<usize>("population-concurrency")
        .unwrap_or(&50);
    let timeout = *args.get_one::<u64>("timeout").unwrap_or(&10);

    let config = CheckConfig::new(root)
        .with_recursive(args.get_flag("recursive"))
        .with_internal_only(args.get_flag("internal-only"))
        .with_follow_source_maps(args.get_flag("source-maps"))
        .with_pretty_urls(args.get_flag("pretty-urls"))
        .with_concurrency(concurrency)
        .with_population_concurrency(population_concurrency)
        .with_timeout(Duration::from_secs(timeout))
        .with_cooldown_retry(!args.get_flag("no-cooldown-retry"));
    config.validate()?;
    Ok(config)
}

fn patterns(args: &ArgMatches, id: &str) -> Vec<String> {
    args.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// A reporter with the `--skip` and `--todo` name filters attached.
pub fn build_reporter(skip: Vec<String>, todo: Vec<String>) -> Reporter {
    let mut reporter = Reporter::new();
    if !skip.is_empty() {
        reporter = reporter.with_skip_filter(name_filter(skip));
    }
    if !todo.is_empty() {
        reporter = reporter.with_todo_filter(name_filter(todo));
    }
    reporter
}

/// One event in the chosen format, without a trailing newline.
pub fn format_event(
    format: OutputFormat,
    renderer: &mut TapRenderer,
    event: &ReportEvent,
) -> String {
    match format {
        OutputFormat::Tap => renderer.render(event),
        OutputFormat::Json => serde_json::to_string(event)
            .unwrap_or_else(|e| format!("{{\"error\":{:?}}}", e.to_string())),
    }
}

pub fn format_summary(format: OutputFormat, tally: &Tally) -> String {
    match format {
        OutputFormat::Tap => TapRenderer::new().summary(tally),
        OutputFormat::Json => serde_json::to_string(tally)
            .unwrap_or_else(|e| format!("{{\"error\":{:?}}}", e.to_string())),
    }
}

/// Sink that writes each event to stdout as soon as the reporter emits it.
pub fn stdout_sink(format: OutputFormat) -> ReportSink {
    let renderer = Mutex::new(TapRenderer::new());
    Arc::new(move |event: &ReportEvent| {
        let mut renderer = renderer.lock().unwrap_or_else(PoisonError::into_inner);
        let line = format_event(format, &mut renderer, event);
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            debug!("Failed to write report event: {}", e);
        }
    })
}

/// Failing findings fail the run.
pub fn exit_code(tally: &Tally) -> i32 {
    if tally.is_success() { 0 } else { 1 }
}

pub async fn handle_check(
    args: &ArgMatches,
    progress_callback: Option<ProgressCallback>,
) -> Result<Tally> {
    let graph_arg = args
        .get_one::<String>("GRAPH")
        .context("a graph file is required")?;
    let format_arg = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("tap");
    let format: OutputFormat = format_arg.parse()?;

    let config = build_config(args)?;
    let mut graph = load_graph(graph_arg, config.pretty_urls)?;
    let mut reporter = build_reporter(patterns(args, "skip"), patterns(args, "todo"))
        .with_sink(stdout_sink(format));

    let mut checker = Checker::new(config)?;
    if let Some(callback) = progress_callback {
        checker = checker.with_progress_callback(callback);
    }

    if format == OutputFormat::Tap {
        println!("{}", TapRenderer::new().header());
    }
    let tally = checker.run(&mut graph, &mut reporter).await?;
    println!("{}", format_summary(format, &tally));
    Ok(tally)
}

/// Human-readable totals for the terminal, written to stderr.
pub fn print_tally(tally: &Tally) {
    let fail = if tally.fail > 0 {
        tally.fail.to_string().red().bold()
    } else {
        tally.fail.to_string().green()
    };
    eprintln!(
        "{} {} checks: {} passed, {} failed, {} skipped, {} todo",
        if tally.is_success() {
            "✓".green().bold()
        } else {
            "✗".red().bold()
        },
        tally.count,
        tally.pass.to_string().green(),
        fail,
        tally.skip.to_string().yellow(),
        tally.todo.to_string().cyan()
    );
}
