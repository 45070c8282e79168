use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("anchorage")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("anchorage")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress and log output")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("check")
                .about(
                    "Check the links, redirects, fragments and mixed content of a site's asset \
                graph",
                )
                .arg(
                    arg!(<GRAPH>)
                        .required(true)
                        .help("Path to the asset graph JSON file"),
                )
                .arg(
                    arg!(-r --"root" <URL>)
                        .required(true)
                        .help("Base URL of the site; targets under it are internal")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"recursive")
                        .required(false)
                        .help("Load the internal documents anchors point at")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"internal-only")
                        .required(false)
                        .help("Only verify targets under the root")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"source-maps")
                        .required(false)
                        .help("Follow and verify source map references")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"pretty-urls")
                        .required(false)
                        .help("Resolve extension-less URLs to .html and index.html documents")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM_WORKERS>)
                        .required(false)
                        .help("Maximum number of external targets verified at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(--"population-concurrency" <NUM_WORKERS>)
                        .required(false)
                        .help("Maximum number of assets loaded at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"no-cooldown-retry")
                        .required(false)
                        .help("Give up after the GET retry instead of waiting and trying once more")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"skip" <PATTERN>)
                        .required(false)
                        .help("Skip findings whose name contains PATTERN (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"todo" <PATTERN>)
                        .required(false)
                        .help("Mark findings whose name contains PATTERN as todo (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: tap, json")
                        .value_parser(["tap", "json"])
                        .default_value("tap"),
                ),
        )
}
