// Mixed content: secure pages pulling content over plain http

use crate::model::Relation;
use crate::report::{Check, Report};
use anchorage_scanner::{Hop, VerificationOutcome};

/// A referencing edge plus whether its containing document is https.
#[derive(Debug, Clone, Copy)]
pub struct ReferencingEdge<'a> {
    pub relation: &'a Relation,
    pub secure_origin: bool,
}

fn is_insecure(url: &str) -> bool {
    url.starts_with("http:")
}

fn secured(url: &str) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{}", rest),
        None => url.to_string(),
    }
}

/// The chain as it would read if every hop stayed on https.
pub fn secured_chain_string(outcome: &VerificationOutcome) -> String {
    if outcome.chain.is_empty() {
        return format!("{} {}", outcome.outcome.label(), secured(&outcome.url));
    }
    outcome
        .chain
        .iter()
        .map(|hop| Hop::new(secured(&hop.url), hop.status).to_string())
        .collect::<Vec<_>>()
        .join(" --> ")
}

pub fn check_mixed_content(
    outcome: &VerificationOutcome,
    edges: &[ReferencingEdge<'_>],
) -> Option<Report> {
    let secure_sources: Vec<&ReferencingEdge<'_>> = edges
        .iter()
        .filter(|edge| !edge.relation.kind.is_navigational() && edge.secure_origin)
        .collect();

    if secure_sources.is_empty() {
        return None;
    }

    if !outcome.visited_urls().into_iter().any(is_insecure) {
        return None;
    }

    let at: Vec<String> = secure_sources
        .iter()
        .map(|edge| edge.relation.location.to_string())
        .collect();

    Some(
        Report::fail(Check::MixedContent, &outcome.url)
            .expected(secured_chain_string(outcome))
            .actual(outcome.chain_string())
            .at(at.join("\n")),
    )
}
