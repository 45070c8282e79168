// Target groups and the findings drawn from a verification outcome

use crate::model::Relation;
use crate::report::{Check, Report};
use anchorage_scanner::{Hop, VerificationOutcome};
use std::collections::BTreeMap;

/// Every relation pointing at one fragment-stripped URL. The URL is
/// verified once for the whole group.
#[derive(Debug, Clone)]
pub struct TargetGroup {
    pub url: String,
    pub relations: Vec<Relation>,
}

impl TargetGroup {
    /// Source locations of every referencing edge, one per line.
    pub fn at(&self) -> String {
        self.relations
            .iter()
            .map(|relation| relation.location.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Group relations by target, in URL order.
pub fn group_targets(relations: Vec<Relation>) -> Vec<TargetGroup> {
    let mut groups: BTreeMap<String, Vec<Relation>> = BTreeMap::new();
    for relation in relations {
        groups
            .entry(relation.target_without_fragment().to_string())
            .or_default()
            .push(relation);
    }
    groups
        .into_iter()
        .map(|(url, relations)| TargetGroup { url, relations })
        .collect()
}

/// Anything but a final 200 fails.
pub fn check_status(outcome: &VerificationOutcome, group: &TargetGroup) -> Report {
    let report = if outcome.is_ok() {
        Report::pass(Check::ExternalCheck, &group.url)
    } else {
        Report::fail(Check::ExternalCheck, &group.url)
    };
    report
        .expected(format!("200 {}", group.url))
        .actual(format!("{} {}", outcome.outcome.label(), group.url))
        .at(group.at())
}

/// Temporary redirects are fine; a permanent one means the link should be
/// updated to point at the new location.
pub fn check_redirects(outcome: &VerificationOutcome, group: &TargetGroup) -> Option<Report> {
    if !outcome.has_redirects() {
        return None;
    }

    let report = if outcome.has_permanent_redirect() {
        let expected = outcome
            .chain
            .iter()
            .map(|hop| {
                let status = match hop.status {
                    301 => 302,
                    308 => 307,
                    other => other,
                };
                Hop::new(hop.url.clone(), status).to_string()
            })
            .collect::<Vec<_>>()
            .join(" --> ");
        Report::fail(Check::ExternalRedirect, &group.url).expected(expected)
    } else {
        Report::pass(Check::ExternalRedirect, &group.url).expected(outcome.chain_string())
    };

    Some(report.actual(outcome.chain_string()).at(group.at()))
}
