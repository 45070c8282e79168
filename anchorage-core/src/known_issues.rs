// Hosts that answer automated checks with statuses that say nothing about
// whether the link works

use crate::report::{Check, Report};
use std::sync::Arc;
use url::Url;

pub type IssuePredicate = Arc<dyn Fn(&Report) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct KnownIssue {
    pub reason: String,
    predicate: IssuePredicate,
}

impl KnownIssue {
    pub fn new(reason: impl Into<String>, predicate: IssuePredicate) -> Self {
        Self {
            reason: reason.into(),
            predicate,
        }
    }

    pub fn matches(&self, report: &Report) -> bool {
        (self.predicate)(report)
    }
}

impl std::fmt::Debug for KnownIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnownIssue")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// The URL a report is about, taken from its name (`<operator> <url>`).
pub fn subject_url(report: &Report) -> Option<Url> {
    let (_, subject) = report.name.split_once(' ')?;
    Url::parse(subject).ok()
}

fn actual_status(report: &Report) -> Option<u16> {
    report
        .actual
        .as_deref()
        .and_then(|actual| actual.split_whitespace().next())
        .and_then(|code| code.parse().ok())
}

fn host_matches(report: &Report, domain: &str) -> bool {
    subject_url(report)
        .and_then(|url| url.host_str().map(str::to_owned))
        .is_some_and(|host| host == domain || host.ends_with(&format!(".{}", domain)))
}

pub fn builtin() -> Vec<KnownIssue> {
    vec![
        KnownIssue::new(
            "LinkedIn answers automated requests with status 999",
            Arc::new(|report: &Report| {
                report.is(Check::ExternalCheck)
                    && actual_status(report) == Some(999)
                    && host_matches(report, "linkedin.com")
            }),
        ),
        KnownIssue::new(
            "Host rate limited the check (429 Too Many Requests)",
            Arc::new(|report: &Report| {
                report.is(Check::ExternalCheck) && actual_status(report) == Some(429)
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(url: &str, status: u16) -> Report {
        Report::fail(Check::ExternalCheck, url)
            .expected(format!("200 {}", url))
            .actual(format!("{} {}", status, url))
    }

    #[test]
    fn test_linkedin_999_matches() {
        let issues = builtin();
        let report = failing("https://www.linkedin.com/in/someone", 999);
        assert!(issues[0].matches(&report));
    }

    #[test]
    fn test_999_elsewhere_does_not_match() {
        let issues = builtin();
        let report = failing("https://example.com/", 999);
        assert!(!issues.iter().any(|issue| issue.matches(&report)));
    }

    #[test]
    fn test_subject_url() {
        let report = failing("https://example.com/a?b=c", 404);
        assert_eq!(
            subject_url(&report).unwrap().as_str(),
            "https://example.com/a?b=c"
        );
    }
}
