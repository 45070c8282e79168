pub mod check;
pub mod classify;
pub mod config;
pub mod error;
pub mod external;
pub mod fragment;
pub mod graph;
pub mod hints;
pub mod known_issues;
pub mod mixed;
pub mod model;
pub mod provider;
pub mod report;
pub mod reporter;
pub mod tap;

use colored::Colorize;

pub use check::Checker;
pub use config::CheckConfig;
pub use error::{CheckError, Result};
pub use graph::MemoryGraph;
pub use model::{Asset, AssetId, AssetKind, Relation, RelationId, RelationKind, SourceLocation};
pub use provider::{GraphProvider, ProviderError};
pub use report::{Check, Mark, Report, ReportEvent, Tally};
pub use reporter::{ReportFilter, ReportSink, Reporter, name_filter};
pub use tap::TapRenderer;

const BANNER: &str = r"
   __ _ _ __   ___| |__   ___  _ __ __ _  __ _  ___
  / _` | '_ \ / __| '_ \ / _ \| '__/ _` |/ _` |/ _ \
 | (_| | | | | (__| | | | (_) | | | (_| | (_| |  __/
  \__,_|_| |_|\___|_| |_|\___/|_|  \__,_|\__, |\___|
                                         |___/
";

/// Written to stderr so it never mixes with the report stream.
pub fn print_banner() {
    eprintln!("{}", BANNER.cyan());
    eprintln!(
        "  {} {}\n",
        "links, redirects, fragments and mixed content".dimmed(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}
