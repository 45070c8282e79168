// Relation classifier: which edges get loaded, which get verified over the
// network and which are left alone

use crate::config::CheckConfig;
use crate::model::Relation;
use crate::provider::RelationFilter;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Load the target as part of the site
    Populate,
    /// Check the target over the network without loading it
    Verify,
    /// Same-site anchor that is not loaded; fragment-checked only, never requested
    Navigate,
    /// Preconnect and dns-prefetch hints, checked per host
    HostCheck,
    Ignore,
}

#[derive(Debug, Default)]
pub struct Classification {
    pub populate: Vec<Relation>,
    pub verify: Vec<Relation>,
    pub navigate: Vec<Relation>,
    pub host_checks: Vec<Relation>,
    pub ignored: Vec<Relation>,
}

pub fn disposition(relation: &Relation, config: &CheckConfig) -> Disposition {
    if relation.kind.is_host_hint() {
        return Disposition::HostCheck;
    }

    if relation.kind.is_source_map() && !config.follow_source_maps {
        return Disposition::Ignore;
    }

    if !matches!(relation.to.scheme(), "http" | "https" | "file") {
        return Disposition::Ignore;
    }

    let internal = !relation.cross_origin && config.is_internal(&relation.to);
    let loadable = internal && (!relation.kind.is_navigational() || config.recursive);

    if loadable {
        return Disposition::Populate;
    }

    if internal {
        return Disposition::Navigate;
    }

    if config.internal_only && !internal {
        return Disposition::Ignore;
    }

    if relation.is_http() {
        Disposition::Verify
    } else {
        Disposition::Ignore
    }
}

pub fn classify(relations: Vec<Relation>, config: &CheckConfig) -> Classification {
    let mut classification = Classification::default();
    for relation in relations {
        match disposition(&relation, config) {
            Disposition::Populate => classification.populate.push(relation),
            Disposition::Verify => classification.verify.push(relation),
            Disposition::Navigate => classification.navigate.push(relation),
            Disposition::HostCheck => classification.host_checks.push(relation),
            Disposition::Ignore => classification.ignored.push(relation),
        }
    }
    classification
}

/// The edge filter handed to the provider for population.
pub fn follow_filter(config: &CheckConfig) -> Arc<RelationFilter> {
    let config = config.clone();
    Arc::new(move |relation: &Relation| disposition(relation, &config) == Disposition::Populate)
}
