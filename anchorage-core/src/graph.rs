// In-memory graph provider, loaded from a serialized asset graph

use crate::model::{
    Asset, AssetId, AssetKind, Relation, RelationId, RelationKind, SourceLocation, same_origin,
    strip_fragment,
};
use crate::provider::{GraphProvider, ProviderError, RelationFilter};
use crate::report::{Check, Report};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub url: String,
    pub kind: AssetKind,
    #[serde(default)]
    pub inline: bool,
    /// Index of the containing asset, for inline assets
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub ids: Vec<String>,
    /// Entry point, loaded before anything else
    #[serde(default)]
    pub initial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Index of the source asset
    pub from: usize,
    pub kind: RelationKind,
    pub href: String,
    /// Absolute target; resolved from `href` against the source when absent
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub cross_origin: Option<bool>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

#[derive(Debug)]
pub struct MemoryGraph {
    graph: DiGraph<Asset, Relation>,
    by_url: HashMap<String, AssetId>,
    available: HashSet<AssetId>,
    initial: Vec<AssetId>,
    element_ids: HashMap<AssetId, BTreeSet<String>>,
    pretty_urls: bool,
    reports: Vec<Report>,
}

impl MemoryGraph {
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let document: GraphDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_document(document: GraphDocument) -> Result<Self, ProviderError> {
        let mut memory = Self {
            graph: DiGraph::new(),
            by_url: HashMap::new(),
            available: HashSet::new(),
            initial: Vec::new(),
            element_ids: HashMap::new(),
            pretty_urls: false,
            reports: Vec::new(),
        };

        let asset_count = document.assets.len();
        for (index, record) in document.assets.iter().enumerate() {
            let url = Url::parse(&record.url)
                .map_err(|e| ProviderError::Malformed(format!("asset {} url '{}': {}", index, record.url, e)))?;
            if let Some(parent) = record.parent
                && parent >= asset_count
            {
                return Err(ProviderError::Malformed(format!(
                    "asset {} has unknown parent {}",
                    index, parent
                )));
            }
            if record.inline && record.parent.is_none() {
                return Err(ProviderError::Malformed(format!(
                    "inline asset {} has no parent",
                    index
                )));
            }

            let id = AssetId(index);
            memory.graph.add_node(Asset {
                id,
                url: if record.inline { url } else { strip_fragment(&url) },
                kind: record.kind,
                is_inline: record.inline,
                parent: record.parent.map(AssetId),
                content_type: record.content_type.clone(),
                is_loaded: false,
                content: record.content.clone(),
            });
            memory.available.insert(id);
            if !record.inline {
                memory.by_url.insert(memory.graph[NodeIndex::new(index)].url.to_string(), id);
            }
            if !record.ids.is_empty() {
                memory
                    .element_ids
                    .insert(id, record.ids.iter().cloned().collect());
            }
            if record.initial {
                memory.initial.push(id);
            }
        }

        if memory.initial.is_empty() && asset_count > 0 {
            memory.initial.push(AssetId(0));
        }

        for (index, record) in document.relations.into_iter().enumerate() {
            memory.add_relation(RelationId(index), record)?;
        }

        Ok(memory)
    }

    pub fn with_pretty_urls(mut self, pretty_urls: bool) -> Self {
        self.pretty_urls = pretty_urls;
        self
    }

    fn add_relation(&mut self, id: RelationId, record: RelationRecord) -> Result<(), ProviderError> {
        if record.from >= self.graph.node_count() {
            return Err(ProviderError::Malformed(format!(
                "relation {} comes from unknown asset {}",
                id.0, record.from
            )));
        }
        let from = AssetId(record.from);
        let document = self.containing_document(from).unwrap_or(from);
        let base = self.graph[NodeIndex::new(document.0)].url.clone();

        let to = match record.to {
            Some(ref to) => Url::parse(to),
            None => base.join(&record.href),
        }
        .map_err(|e| ProviderError::Malformed(format!("relation {} target '{}': {}", id.0, record.href, e)))?;

        let target = self.target_or_placeholder(&to, record.kind);
        let mut location = SourceLocation::new(base.as_str());
        location.line = record.line;
        location.column = record.column;

        let relation = Relation {
            id,
            from,
            kind: record.kind,
            href: record.href,
            cross_origin: record.cross_origin.unwrap_or_else(|| !same_origin(&base, &to)),
            to,
            location,
        };
        self.graph
            .add_edge(NodeIndex::new(from.0), NodeIndex::new(target.0), relation);
        Ok(())
    }

    /// Targets nobody declared still get a node, created on first reference
    /// and never loadable.
    fn target_or_placeholder(&mut self, to: &Url, kind: RelationKind) -> AssetId {
        let key = strip_fragment(to);
        if let Some(id) = self.by_url.get(key.as_str()) {
            return *id;
        }
        let id = AssetId(self.graph.node_count());
        self.graph.add_node(Asset {
            id,
            url: key.clone(),
            kind: kind.implied_asset_kind().unwrap_or(AssetKind::Other),
            is_inline: false,
            parent: None,
            content_type: None,
            is_loaded: false,
            content: None,
        });
        self.by_url.insert(key.to_string(), id);
        id
    }

    fn resolve(&self, to: &Url) -> Option<AssetId> {
        let key = strip_fragment(to);
        let exact = self.by_url.get(key.as_str()).copied();
        if exact.is_some_and(|id| self.available.contains(&id)) || !self.pretty_urls {
            return exact;
        }
        pretty_alternatives(&key)
            .iter()
            .filter_map(|candidate| self.by_url.get(candidate.as_str()).copied())
            .find(|id| self.available.contains(id))
            .or(exact)
    }

    fn mark_loaded(&mut self, id: AssetId) {
        if let Some(asset) = self.graph.node_weight_mut(NodeIndex::new(id.0)) {
            asset.is_loaded = true;
        }
    }

    fn inline_children(&self, id: AssetId) -> Vec<AssetId> {
        self.graph
            .node_weights()
            .filter(|asset| asset.is_inline && asset.parent == Some(id))
            .map(|asset| asset.id)
            .collect()
    }

    fn check_content_types(&mut self) {
        let mut implied: BTreeMap<AssetId, Vec<(AssetKind, String)>> = BTreeMap::new();
        for relation in self.graph.edge_weights() {
            if let Some(kind) = relation.kind.implied_asset_kind()
                && let Some(target) = self.resolve(&relation.to)
            {
                implied
                    .entry(target)
                    .or_default()
                    .push((kind, relation.location.to_string()));
            }
        }

        let mut reports = Vec::new();
        for asset in self.graph.node_weights() {
            if !asset.is_loaded || asset.is_inline {
                continue;
            }

            if asset.content_type.is_none() && matches!(asset.url.scheme(), "http" | "https") {
                reports.push(
                    Report::fail(Check::ContentTypeMissing, &asset.url)
                        .expected(format!("Content-Type for {}", asset.kind.as_str()))
                        .at(asset.url.as_str()),
                );
            }

            let Some(uses) = implied.get(&asset.id) else {
                continue;
            };
            let conflicting: Vec<&(AssetKind, String)> =
                uses.iter().filter(|(kind, _)| *kind != asset.kind).collect();
            if conflicting.is_empty() {
                continue;
            }
            let mut kinds: Vec<&str> = conflicting.iter().map(|(kind, _)| kind.as_str()).collect();
            kinds.sort_unstable();
            kinds.dedup();
            let at: Vec<&str> = conflicting.iter().map(|(_, at)| at.as_str()).collect();
            reports.push(
                Report::fail(Check::ContentTypeMismatch, &asset.url)
                    .expected(asset.kind.as_str())
                    .actual(kinds.join(", "))
                    .at(at.join("\n")),
            );
        }
        self.reports.extend(reports);
    }
}

/// `/about` may be served from `/about.html` or `/about/index.html`.
fn pretty_alternatives(url: &Url) -> Vec<Url> {
    let path = url.path();
    let mut candidates = Vec::new();
    if path.ends_with('/') {
        if let Ok(index) = url.join("index.html") {
            candidates.push(index);
        }
    } else if !path.rsplit('/').next().unwrap_or("").contains('.') {
        let mut html = url.clone();
        html.set_path(&format!("{}.html", path));
        candidates.push(html);
        let mut index = url.clone();
        index.set_path(&format!("{}/index.html", path));
        candidates.push(index);
    }
    candidates
}

impl GraphProvider for MemoryGraph {
    fn find_assets(&self, filter: &dyn Fn(&Asset) -> bool) -> Vec<Asset> {
        self.graph
            .node_weights()
            .filter(|asset| filter(asset))
            .cloned()
            .collect()
    }

    fn find_relations(&self, filter: &dyn Fn(&Relation) -> bool) -> Vec<Relation> {
        let mut relations: Vec<Relation> = self
            .graph
            .edge_weights()
            .filter(|relation| filter(relation))
            .cloned()
            .collect();
        relations.sort_by_key(|relation| relation.id);
        relations
    }

    fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.graph.node_weight(NodeIndex::new(id.0))
    }

    fn target_of(&self, relation: &Relation) -> Option<AssetId> {
        self.resolve(&relation.to)
    }

    async fn populate(
        &mut self,
        follow: &RelationFilter,
        concurrency: usize,
    ) -> Result<(), ProviderError> {
        if self.initial.is_empty() {
            return Err(ProviderError::Fatal("graph has no assets to start from".to_string()));
        }
        info!(
            "Populating graph from {} initial assets, {} at a time",
            self.initial.len(),
            concurrency
        );

        let mut frontier: VecDeque<AssetId> = self.initial.iter().copied().collect();
        let mut queued: HashSet<AssetId> = frontier.iter().copied().collect();
        let mut missing: BTreeMap<String, Vec<String>> = BTreeMap::new();

        while !frontier.is_empty() {
            let batch_size = frontier.len().min(concurrency.max(1));
            let batch: Vec<AssetId> = frontier.drain(..batch_size).collect();

            for id in batch {
                if !self.available.contains(&id) {
                    continue;
                }
                self.mark_loaded(id);
                debug!("Loaded {}", self.graph[NodeIndex::new(id.0)].url);

                for child in self.inline_children(id) {
                    if queued.insert(child) {
                        frontier.push_back(child);
                    }
                }

                let followed: Vec<Relation> = self
                    .graph
                    .edges_directed(NodeIndex::new(id.0), Direction::Outgoing)
                    .map(|edge| edge.weight())
                    .filter(|relation| follow(relation))
                    .cloned()
                    .collect();

                for relation in followed {
                    match self.resolve(&relation.to) {
                        Some(target) if self.available.contains(&target) => {
                            if queued.insert(target) {
                                frontier.push_back(target);
                            }
                        }
                        _ => {
                            missing
                                .entry(relation.target_without_fragment().to_string())
                                .or_default()
                                .push(relation.location.to_string());
                        }
                    }
                }
            }

            tokio::task::yield_now().await;
        }

        for (url, locations) in missing {
            self.reports.push(
                Report::fail(Check::Load, &url)
                    .expected(format!("200 {}", url))
                    .actual(format!("ENOENT {}", url))
                    .at(locations.join("\n")),
            );
        }
        self.check_content_types();

        let loaded = self.graph.node_weights().filter(|asset| asset.is_loaded).count();
        info!("Population complete. {} assets loaded", loaded);
        Ok(())
    }

    fn element_ids(&self, id: AssetId) -> Option<&BTreeSet<String>> {
        let asset = self.asset(id)?;
        if !asset.is_loaded || !asset.kind.is_document() {
            return None;
        }
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        Some(self.element_ids.get(&id).unwrap_or(&EMPTY))
    }

    fn containing_document(&self, id: AssetId) -> Option<AssetId> {
        let mut current = self.asset(id)?;
        while current.is_inline {
            current = self.asset(current.parent?)?;
        }
        Some(current.id)
    }

    fn release(&mut self, id: AssetId) {
        if let Some(asset) = self.graph.node_weight_mut(NodeIndex::new(id.0)) {
            debug!("Releasing {}", asset.url);
            asset.content = None;
            asset.is_loaded = false;
        }
        self.element_ids.remove(&id);
    }

    fn drain_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }
}
