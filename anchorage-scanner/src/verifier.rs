use crate::error::{Result, ScanError};
use crate::result::{Hop, Outcome, TransportError, VerificationOutcome};
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::LOCATION;
use reqwest::{Client, Method};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Called with the number of completed targets and the URL just finished.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

pub struct Verifier {
    client: Client,
    concurrency: usize,
    cooldown: Duration,
    cooldown_retry: bool,
    max_redirects: usize,
    progress_callback: Option<ProgressCallback>,
    completed: Arc<AtomicUsize>,
}

impl Verifier {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        // Redirects are followed by hand so every hop can be recorded.
        let client = Client::builder()
            .user_agent("Anchorage/0.1 (https://github.com/trapdoorsec/anchorage)")
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
            cooldown: DEFAULT_COOLDOWN,
            cooldown_retry: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            progress_callback: None,
            completed: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(ScanError::InvalidSetting(
                "verification concurrency must be at least 1".to_string(),
            ));
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Whether a URL that still fails after the GET retry gets one more GET
    /// after the cool-down.
    pub fn with_cooldown_retry(mut self, enabled: bool) -> Self {
        self.cooldown_retry = enabled;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Verify every URL with at most `concurrency` in flight. Outcomes are
    /// yielded in completion order. Callers pass distinct URLs; each one
    /// is checked exactly once.
    pub fn verify_all(
        &self,
        urls: Vec<String>,
    ) -> impl Stream<Item = VerificationOutcome> + Send + '_ {
        info!(
            "Verifying {} external targets with {} workers",
            urls.len(),
            self.concurrency
        );
        stream::iter(urls)
            .map(move |url| async move { self.verify(&url).await })
            .buffer_unordered(self.concurrency)
    }

    /// Run the attempt ladder for one URL. Attempts never overlap.
    pub async fn verify(&self, url: &str) -> VerificationOutcome {
        let start = Instant::now();
        let mut result = VerificationOutcome::new(url.to_string());

        let target = match Url::parse(url) {
            Ok(target) => target,
            Err(e) => {
                warn!("Cannot verify {}: {}", url, e);
                result.outcome = Outcome::Failed(TransportError::Other(format!("Invalid URL: {}", e)));
                self.report_progress(url);
                return result;
            }
        };

        let (mut chain, mut outcome) = self.follow(Method::HEAD, &target).await;
        result.attempts = 1;

        let head_rejected = outcome.is_client_or_server_error()
            || matches!(&outcome, Outcome::Failed(error) if error.warrants_get_retry());

        if head_rejected {
            debug!("HEAD {} gave {}, retrying with GET", url, outcome.label());
            (chain, outcome) = self.follow(Method::GET, &target).await;
            result.attempts = 2;

            if outcome.is_client_or_server_error() && self.cooldown_retry {
                debug!(
                    "GET {} gave {}, retrying once more in {:?}",
                    url,
                    outcome.label(),
                    self.cooldown
                );
                tokio::time::sleep(self.cooldown).await;
                (chain, outcome) = self.follow(Method::GET, &target).await;
                result.attempts = 3;
            }
        }

        if outcome != Outcome::Status(200) {
            warn!("{} -> {}", url, outcome.label());
        }

        result.chain = chain;
        result.outcome = outcome;
        result.response_time = start.elapsed();
        self.report_progress(url);
        result
    }

    /// Issue one request and follow its redirects, recording every response.
    async fn follow(&self, method: Method, start: &Url) -> (Vec<Hop>, Outcome) {
        let mut hops = Vec::new();
        let mut current = start.clone();

        loop {
            let response = match self.client.request(method.clone(), current.clone()).send().await {
                Ok(response) => response,
                Err(e) => return (hops, Outcome::Failed(TransportError::classify(&e))),
            };

            let status = response.status();
            hops.push(Hop::new(current.as_str(), status.as_u16()));

            if !status.is_redirection() {
                return (hops, Outcome::Status(status.as_u16()));
            }

            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return (hops, Outcome::Status(status.as_u16()));
            };

            if hops.len() > self.max_redirects {
                return (hops, Outcome::Failed(TransportError::TooManyRedirects));
            }

            match current.join(location) {
                Ok(next) => {
                    debug!("{} {} -> {}", status.as_u16(), current, next);
                    current = next;
                }
                Err(e) => {
                    warn!("Unparseable Location '{}' from {}: {}", location, current, e);
                    return (hops, Outcome::Status(status.as_u16()));
                }
            }
        }
    }

    fn report_progress(&self, url: &str) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref callback) = self.progress_callback {
            callback(done, url.to_string());
        }
    }
}
