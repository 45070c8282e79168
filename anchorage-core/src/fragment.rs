// Fragment validation for anchors pointing into documents

use crate::model::{Relation, RelationKind, strip_fragment};
use crate::provider::GraphProvider;
use crate::report::{Check, Report};
use percent_encoding::percent_decode_str;

pub const EMPTY_FRAGMENT_MESSAGE: &str =
    "fragment identifiers in cross-document links must not be empty";

/// Whether the validator has anything to say about this edge.
pub fn is_eligible(relation: &Relation) -> bool {
    relation.kind == RelationKind::Anchor && relation.fragment().is_some()
}

pub fn check_fragment<P: GraphProvider>(provider: &P, relation: &Relation) -> Option<Report> {
    let fragment = relation.fragment()?;
    let subject = format!("{} --> {}", relation.location.url, relation.href);

    if fragment.is_empty() {
        let source_document = provider
            .containing_document(relation.from)
            .and_then(|id| provider.asset(id))
            .map(|asset| strip_fragment(&asset.url));
        if source_document.as_ref() == Some(&relation.target_without_fragment()) {
            return None;
        }
        return Some(
            Report::fail(Check::FragmentCheck, subject)
                .expected(EMPTY_FRAGMENT_MESSAGE)
                .actual(relation.href.clone())
                .at(relation.location.to_string()),
        );
    }

    let target = provider.target_of(relation)?;
    let ids = provider.element_ids(target)?;

    let decoded = percent_decode_str(fragment).decode_utf8_lossy();
    let expected = format!("id=\"{}\"", decoded);
    let found = ids.contains(fragment) || ids.contains(&*decoded);

    let report = if found {
        Report::pass(Check::FragmentCheck, subject).actual(expected.clone())
    } else {
        Report::fail(Check::FragmentCheck, subject)
    };
    Some(report.expected(expected).at(relation.location.to_string()))
}

/// One report per eligible anchor whose target can be inspected.
pub fn check_fragments<P: GraphProvider>(provider: &P, relations: &[Relation]) -> Vec<Report> {
    relations
        .iter()
        .filter(|relation| is_eligible(relation))
        .filter_map(|relation| check_fragment(provider, relation))
        .collect()
}
