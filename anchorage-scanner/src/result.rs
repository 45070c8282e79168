use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One response observed while following a request: the URL that was
/// requested and the status it answered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub url: String,
    pub status: u16,
}

impl Hop {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// 301 and 308 tell clients to update their links.
    pub fn is_permanent_redirect(&self) -> bool {
        matches!(self.status, 301 | 308)
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.url)
    }
}

/// Transport-level failures, classified from the HTTP client's error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TransportError {
    /// The host name does not resolve
    DnsNotFound,
    /// The server answered with something the client could not parse.
    /// Usually a server that mishandles HEAD, so it earns a GET retry.
    Protocol(String),
    Timeout,
    /// Certificate or handshake failure
    Tls(String),
    TooManyRedirects,
    Other(String),
}

impl TransportError {
    pub fn classify(error: &reqwest::Error) -> Self {
        let mut chain = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(inner) = source {
            chain.push_str(": ");
            chain.push_str(&inner.to_string());
            source = inner.source();
        }
        let lowered = chain.to_lowercase();

        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_redirect() {
            TransportError::TooManyRedirects
        } else if lowered.contains("dns error")
            || lowered.contains("failed to lookup address")
            || lowered.contains("name or service not known")
            || lowered.contains("no such host")
        {
            TransportError::DnsNotFound
        } else if lowered.contains("certificate")
            || lowered.contains("tls")
            || lowered.contains("ssl")
        {
            TransportError::Tls(chain)
        } else if lowered.contains("invalid http")
            || lowered.contains("parse error")
            || lowered.contains("unexpected eof")
            || lowered.contains("connection closed before message completed")
            || error.is_decode()
            || error.is_body()
        {
            TransportError::Protocol(chain)
        } else {
            TransportError::Other(chain)
        }
    }

    /// Short technical label used as the `actual` value of a failing report.
    pub fn label(&self) -> String {
        match self {
            TransportError::DnsNotFound => "ENOTFOUND".to_string(),
            TransportError::Protocol(_) => "EPROTO".to_string(),
            TransportError::Timeout => "ETIMEDOUT".to_string(),
            TransportError::Tls(_) => "ECERT".to_string(),
            TransportError::TooManyRedirects => "ETOOMANYREDIRECTS".to_string(),
            TransportError::Other(message) => message.clone(),
        }
    }

    pub fn warrants_get_retry(&self) -> bool {
        matches!(self, TransportError::Protocol(_))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Protocol(detail)
            | TransportError::Tls(detail) => write!(f, "{} ({})", self.label(), detail),
            _ => f.write_str(&self.label()),
        }
    }
}

/// How the last attempt for a URL ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Status(u16),
    Failed(TransportError),
}

impl Outcome {
    pub fn label(&self) -> String {
        match self {
            Outcome::Status(code) => code.to_string(),
            Outcome::Failed(error) => error.label(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Status(code) => Some(*code),
            Outcome::Failed(_) => None,
        }
    }

    pub fn is_client_or_server_error(&self) -> bool {
        matches!(self, Outcome::Status(code) if *code >= 400)
    }
}

/// Final result of verifying one fragment-stripped target URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// The URL as requested, fragment removed
    pub url: String,
    pub outcome: Outcome,
    /// Every response seen on the final attempt, in order. Empty when the
    /// first request never got an answer.
    pub chain: Vec<Hop>,
    /// Number of request sequences made, 1 to 3
    pub attempts: u8,
    pub response_time: Duration,
}

impl VerificationOutcome {
    pub fn new(url: String) -> Self {
        Self {
            url,
            outcome: Outcome::Failed(TransportError::Other("not attempted".to_string())),
            chain: Vec::new(),
            attempts: 0,
            response_time: Duration::from_secs(0),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Status(200)
    }

    pub fn first_hop_status(&self) -> Option<u16> {
        self.chain.first().map(|hop| hop.status)
    }

    pub fn redirects(&self) -> impl Iterator<Item = &Hop> {
        self.chain.iter().filter(|hop| hop.is_redirect())
    }

    pub fn has_redirects(&self) -> bool {
        self.redirects().next().is_some()
    }

    pub fn has_permanent_redirect(&self) -> bool {
        self.redirects().any(Hop::is_permanent_redirect)
    }

    /// URL of the last hop, or the requested URL when nothing answered.
    pub fn final_url(&self) -> &str {
        self.chain
            .last()
            .map(|hop| hop.url.as_str())
            .unwrap_or(&self.url)
    }

    /// The requested URL followed by every URL the chain visited.
    pub fn visited_urls(&self) -> Vec<&str> {
        let mut urls = vec![self.url.as_str()];
        for hop in &self.chain {
            if urls.last() != Some(&hop.url.as_str()) {
                urls.push(hop.url.as_str());
            }
        }
        urls
    }

    /// `302 https://a --> 200 https://b`, or `ENOTFOUND https://a` when the
    /// request failed before any response.
    pub fn chain_string(&self) -> String {
        if self.chain.is_empty() {
            return format!("{} {}", self.outcome.label(), self.url);
        }
        let mut parts: Vec<String> = self.chain.iter().map(Hop::to_string).collect();
        if let Outcome::Failed(error) = &self.outcome {
            parts.push(error.label());
        }
        parts.join(" --> ")
    }
}
