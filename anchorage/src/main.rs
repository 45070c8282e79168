use anchorage::command_argument_builder;
use anchorage::handlers::{exit_code, handle_check, print_tally};
use anchorage_core::print_banner;
use anchorage_scanner::ProgressCallback;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

const EXIT_FATAL: i32 = 2;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    match chosen_command.subcommand() {
        Some(("check", primary_command)) => {
            let code = run_check(primary_command, quiet).await;
            std::process::exit(code);
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

async fn run_check(args: &ArgMatches, quiet: bool) -> i32 {
    // Logs go to stderr; stdout carries the report stream
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if quiet { Level::ERROR } else { Level::INFO })
        .init();

    let spinner = (!quiet).then(|| {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Checking...");
        spinner
    });

    let progress_callback: Option<ProgressCallback> = spinner.clone().map(|spinner| {
        let callback: ProgressCallback = Arc::new(move |done: usize, url: String| {
            spinner.set_message(format!("Verified {} targets, last {}", done, url));
        });
        callback
    });

    let result = handle_check(args, progress_callback).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match result {
        Ok(tally) => {
            if !quiet {
                print_tally(&tally);
            }
            exit_code(&tally)
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            EXIT_FATAL
        }
    }
}
