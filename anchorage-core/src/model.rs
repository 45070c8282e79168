// Assets and the relations between them, as handed over by a graph provider

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Html,
    Css,
    #[serde(rename = "javascript")]
    JavaScript,
    Image,
    Font,
    Media,
    SourceMap,
    Json,
    Text,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Html => "html",
            AssetKind::Css => "css",
            AssetKind::JavaScript => "javascript",
            AssetKind::Image => "image",
            AssetKind::Font => "font",
            AssetKind::Media => "media",
            AssetKind::SourceMap => "source_map",
            AssetKind::Json => "json",
            AssetKind::Text => "text",
            AssetKind::Other => "other",
        }
    }

    /// Documents carry an element id index that fragments resolve against.
    pub fn is_document(&self) -> bool {
        matches!(self, AssetKind::Html)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub url: Url,
    pub kind: AssetKind,
    pub is_inline: bool,
    /// Asset an inline asset is embedded in
    pub parent: Option<AssetId>,
    pub content_type: Option<String>,
    pub is_loaded: bool,
    /// Raw text, dropped once the asset is released
    pub content: Option<String>,
}

impl Asset {
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Anchor,
    Stylesheet,
    CssImport,
    CssUrl,
    Script,
    Image,
    Media,
    Iframe,
    Frame,
    Icon,
    Manifest,
    Preload,
    Prefetch,
    Preconnect,
    DnsPrefetch,
    SourceMap,
    SourceMapSource,
    SourceMapFile,
    Other,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Anchor => "anchor",
            RelationKind::Stylesheet => "stylesheet",
            RelationKind::CssImport => "css_import",
            RelationKind::CssUrl => "css_url",
            RelationKind::Script => "script",
            RelationKind::Image => "image",
            RelationKind::Media => "media",
            RelationKind::Iframe => "iframe",
            RelationKind::Frame => "frame",
            RelationKind::Icon => "icon",
            RelationKind::Manifest => "manifest",
            RelationKind::Preload => "preload",
            RelationKind::Prefetch => "prefetch",
            RelationKind::Preconnect => "preconnect",
            RelationKind::DnsPrefetch => "dns_prefetch",
            RelationKind::SourceMap => "source_map",
            RelationKind::SourceMapSource => "source_map_source",
            RelationKind::SourceMapFile => "source_map_file",
            RelationKind::Other => "other",
        }
    }

    /// Following the edge navigates away instead of pulling content in.
    pub fn is_navigational(&self) -> bool {
        matches!(self, RelationKind::Anchor)
    }

    pub fn is_host_hint(&self) -> bool {
        matches!(self, RelationKind::Preconnect | RelationKind::DnsPrefetch)
    }

    pub fn is_source_map(&self) -> bool {
        matches!(
            self,
            RelationKind::SourceMap | RelationKind::SourceMapSource | RelationKind::SourceMapFile
        )
    }

    /// The asset kind a target must have for this edge to make sense.
    pub fn implied_asset_kind(&self) -> Option<AssetKind> {
        match self {
            RelationKind::Stylesheet | RelationKind::CssImport => Some(AssetKind::Css),
            RelationKind::Script => Some(AssetKind::JavaScript),
            RelationKind::Image | RelationKind::Icon => Some(AssetKind::Image),
            RelationKind::Media => Some(AssetKind::Media),
            RelationKind::Iframe | RelationKind::Frame => Some(AssetKind::Html),
            RelationKind::SourceMap => Some(AssetKind::SourceMap),
            RelationKind::Manifest => Some(AssetKind::Json),
            RelationKind::Anchor
            | RelationKind::CssUrl
            | RelationKind::Preload
            | RelationKind::Prefetch
            | RelationKind::Preconnect
            | RelationKind::DnsPrefetch
            | RelationKind::SourceMapSource
            | RelationKind::SourceMapFile
            | RelationKind::Other => None,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a reference was written, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub url: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl SourceLocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{}:{}:{}", self.url, line, column),
            (Some(line), None) => write!(f, "{}:{}", self.url, line),
            _ => f.write_str(&self.url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub from: AssetId,
    pub kind: RelationKind,
    /// The reference exactly as written in the source
    pub href: String,
    /// Absolute target, fragment included
    pub to: Url,
    pub cross_origin: bool,
    pub location: SourceLocation,
}

impl Relation {
    /// `Some("")` for an href ending in a bare `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.to.fragment()
    }

    pub fn target_without_fragment(&self) -> Url {
        strip_fragment(&self.to)
    }

    pub fn is_http(&self) -> bool {
        matches!(self.to.scheme(), "http" | "https")
    }
}

pub fn strip_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped
}

/// Scheme, host and port all match. Unlike `Url::origin`, two `file:` URLs
/// count as the same origin.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
