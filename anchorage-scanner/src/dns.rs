// Host-level checks for preconnect and dns-prefetch hints

use crate::result::TransportError;
use futures::stream::{self, Stream, StreamExt};
use tracing::debug;

pub struct HostResolver {
    concurrency: usize,
}

impl HostResolver {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub async fn resolve(host: &str) -> Result<(), TransportError> {
        debug!("Resolving {}", host);
        match tokio::net::lookup_host((host, 443)).await {
            Ok(mut addrs) => {
                if addrs.next().is_some() {
                    Ok(())
                } else {
                    Err(TransportError::DnsNotFound)
                }
            }
            Err(e) => {
                debug!("Lookup of {} failed: {}", host, e);
                Err(TransportError::DnsNotFound)
            }
        }
    }

    /// Resolve each host once, yielding results in completion order.
    pub fn resolve_all(
        &self,
        hosts: Vec<String>,
    ) -> impl Stream<Item = (String, Result<(), TransportError>)> + Send + '_ {
        stream::iter(hosts)
            .map(|host| async move {
                let result = Self::resolve(&host).await;
                (host, result)
            })
            .buffer_unordered(self.concurrency)
    }
}

impl Default for HostResolver {
    fn default() -> Self {
        Self::new(crate::verifier::DEFAULT_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_localhost_resolves() {
        assert_eq!(HostResolver::resolve("localhost").await, Ok(()));
    }

    #[tokio::test]
    async fn test_invalid_tld_does_not_resolve() {
        assert_eq!(
            HostResolver::resolve("anchorage-test.invalid").await,
            Err(TransportError::DnsNotFound)
        );
    }

    #[tokio::test]
    async fn test_resolve_all_returns_every_host() {
        let resolver = HostResolver::new(2);
        let results: Vec<_> = resolver
            .resolve_all(vec!["localhost".to_string(), "anchorage-test.invalid".to_string()])
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|(host, r)| host == "localhost" && r.is_ok()));
        assert!(
            results
                .iter()
                .any(|(host, r)| host == "anchorage-test.invalid" && r.is_err())
        );
    }
}
