// Preconnect and dns-prefetch hints only promise a host, so they are
// checked by resolving it

use crate::model::{Relation, RelationKind};
use crate::report::{Check, Report};
use anchorage_scanner::HostResolver;
use futures::StreamExt;
use std::collections::{BTreeMap, HashMap};

fn check_for(kind: RelationKind) -> Check {
    match kind {
        RelationKind::DnsPrefetch => Check::DnsPrefetchCheck,
        _ => Check::PreconnectCheck,
    }
}

pub async fn check_hosts(resolver: &HostResolver, relations: &[Relation]) -> Vec<Report> {
    let mut groups: BTreeMap<(Check, String), Vec<&Relation>> = BTreeMap::new();
    for relation in relations {
        if let Some(host) = relation.to.host_str() {
            groups
                .entry((check_for(relation.kind), host.to_string()))
                .or_default()
                .push(relation);
        }
    }

    let mut hosts: Vec<String> = groups.keys().map(|(_, host)| host.clone()).collect();
    hosts.sort();
    hosts.dedup();

    let resolved: HashMap<String, bool> = resolver
        .resolve_all(hosts)
        .map(|(host, result)| (host, result.is_ok()))
        .collect()
        .await;

    groups
        .into_iter()
        .map(|((check, host), relations)| {
            let at: Vec<String> = relations
                .iter()
                .map(|relation| relation.location.to_string())
                .collect();
            let expected = format!("{} resolves", host);
            let report = if resolved.get(&host).copied().unwrap_or(false) {
                Report::pass(check, &host).actual(expected.clone())
            } else {
                Report::fail(check, &host).actual(format!("ENOTFOUND {}", host))
            };
            report.expected(expected).at(at.join("\n"))
        })
        .collect()
}
