// The boundary to whatever builds the asset graph

use crate::model::{Asset, AssetId, Relation};
use crate::report::Report;
use std::collections::BTreeSet;
use std::future::Future;
use thiserror::Error;

/// A condition that stops the whole run. Problems with a single asset are
/// reported, not raised.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed graph: {0}")]
    Malformed(String),

    #[error("{0}")]
    Fatal(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::Malformed(error.to_string())
    }
}

/// Decides which edges population follows.
pub type RelationFilter = dyn Fn(&Relation) -> bool + Send + Sync;

pub trait GraphProvider {
    fn find_assets(&self, filter: &dyn Fn(&Asset) -> bool) -> Vec<Asset>;

    /// A snapshot of the matching edges. Later population does not change it.
    fn find_relations(&self, filter: &dyn Fn(&Relation) -> bool) -> Vec<Relation>;

    fn asset(&self, id: AssetId) -> Option<&Asset>;

    /// The asset an edge resolves to, if the graph has one.
    fn target_of(&self, relation: &Relation) -> Option<AssetId>;

    /// Load the initial assets and everything reachable from them through
    /// edges `follow` accepts, with at most `concurrency` loads in flight.
    fn populate(
        &mut self,
        follow: &RelationFilter,
        concurrency: usize,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Element ids of a loaded document.
    fn element_ids(&self, id: AssetId) -> Option<&BTreeSet<String>>;

    /// Nearest non-inline asset containing `id`, itself if standalone.
    fn containing_document(&self, id: AssetId) -> Option<AssetId>;

    fn is_secure_context(&self, id: AssetId) -> bool {
        self.containing_document(id)
            .and_then(|doc| self.asset(doc))
            .is_some_and(Asset::is_secure)
    }

    /// Drop the asset's content; the core no longer needs it.
    fn release(&mut self, id: AssetId);

    /// Findings the provider made while loading: missing targets, content
    /// type problems. Passed through to the report stream unchanged.
    fn drain_reports(&mut self) -> Vec<Report>;
}
