use crate::error::{CheckError, Result};
use anchorage_scanner::verifier::{DEFAULT_CONCURRENCY, DEFAULT_COOLDOWN, DEFAULT_MAX_REDIRECTS};
use std::time::Duration;
use url::Url;

pub const DEFAULT_POPULATION_CONCURRENCY: usize = 50;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for a check run
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Base URL of the site. Targets under it are internal.
    pub root: Url,
    /// Load the documents anchors point at
    pub recursive: bool,
    /// Only verify targets under `root`
    pub internal_only: bool,
    pub follow_source_maps: bool,
    /// Verification pool size
    pub concurrency: usize,
    /// Graph population pool size
    pub population_concurrency: usize,
    /// Resolve extension-less URLs to documents on the provider side
    pub pretty_urls: bool,
    pub timeout: Duration,
    pub cooldown: Duration,
    pub cooldown_retry: bool,
    pub max_redirects: usize,
}

impl CheckConfig {
    pub fn new(root: Url) -> Self {
        Self {
            root,
            recursive: false,
            internal_only: false,
            follow_source_maps: false,
            concurrency: DEFAULT_CONCURRENCY,
            population_concurrency: DEFAULT_POPULATION_CONCURRENCY,
            pretty_urls: false,
            timeout: DEFAULT_TIMEOUT,
            cooldown: DEFAULT_COOLDOWN,
            cooldown_retry: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_internal_only(mut self, internal_only: bool) -> Self {
        self.internal_only = internal_only;
        self
    }

    pub fn with_follow_source_maps(mut self, follow: bool) -> Self {
        self.follow_source_maps = follow;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_population_concurrency(mut self, concurrency: usize) -> Self {
        self.population_concurrency = concurrency;
        self
    }

    pub fn with_pretty_urls(mut self, pretty_urls: bool) -> Self {
        self.pretty_urls = pretty_urls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_cooldown_retry(mut self, enabled: bool) -> Self {
        self.cooldown_retry = enabled;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.cannot_be_a_base() {
            return Err(CheckError::InvalidConfig(format!(
                "root {} cannot be used as a base URL",
                self.root
            )));
        }
        if self.concurrency == 0 {
            return Err(CheckError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.population_concurrency == 0 {
            return Err(CheckError::InvalidConfig(
                "population concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `url` lives under the configured root.
    pub fn is_internal(&self, url: &Url) -> bool {
        crate::model::same_origin(&self.root, url) && url.path().starts_with(self.root.path())
    }
}
