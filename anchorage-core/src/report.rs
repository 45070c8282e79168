// Findings and the running tally

use serde::{Deserialize, Serialize};
use std::fmt;

/// Skip or todo marker: either a plain flag or an explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mark {
    Flag(bool),
    Reason(String),
}

impl Mark {
    pub fn is_set(&self) -> bool {
        match self {
            Mark::Flag(flag) => *flag,
            Mark::Reason(_) => true,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Mark::Reason(reason) => Some(reason),
            Mark::Flag(_) => None,
        }
    }
}

impl Default for Mark {
    fn default() -> Self {
        Mark::Flag(false)
    }
}

impl From<bool> for Mark {
    fn from(flag: bool) -> Self {
        Mark::Flag(flag)
    }
}

impl From<&str> for Mark {
    fn from(reason: &str) -> Self {
        Mark::Reason(reason.to_string())
    }
}

impl From<String> for Mark {
    fn from(reason: String) -> Self {
        Mark::Reason(reason)
    }
}

/// The kinds of check the engine runs. Providers may report under their own
/// operator names too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Check {
    ExternalCheck,
    ExternalRedirect,
    MixedContent,
    FragmentCheck,
    PreconnectCheck,
    DnsPrefetchCheck,
    Load,
    ContentTypeMismatch,
    ContentTypeMissing,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::ExternalCheck => "external-check",
            Check::ExternalRedirect => "external-redirect",
            Check::MixedContent => "mixed-content",
            Check::FragmentCheck => "fragment-check",
            Check::PreconnectCheck => "preconnect-check",
            Check::DnsPrefetchCheck => "dns-prefetch-check",
            Check::Load => "load",
            Check::ContentTypeMismatch => "content-type-mismatch",
            Check::ContentTypeMissing => "content-type-missing",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub ok: bool,
    pub name: String,
    pub operator: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub at: String,
    #[serde(default)]
    pub skip: Mark,
    #[serde(default)]
    pub todo: Mark,
}

impl Report {
    pub fn new(check: Check, ok: bool, subject: impl fmt::Display) -> Self {
        Self {
            ok,
            name: format!("{} {}", check, subject),
            operator: check.as_str().to_string(),
            expected: None,
            actual: None,
            at: String::new(),
            skip: Mark::default(),
            todo: Mark::default(),
        }
    }

    pub fn pass(check: Check, subject: impl fmt::Display) -> Self {
        Self::new(check, true, subject)
    }

    pub fn fail(check: Check, subject: impl fmt::Display) -> Self {
        Self::new(check, false, subject)
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn at(mut self, at: impl Into<String>) -> Self {
        self.at = at.into();
        self
    }

    pub fn is(&self, check: Check) -> bool {
        self.operator == check.as_str()
    }
}

/// One item of the report stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportEvent {
    Finding(Report),
    Section { name: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub count: usize,
    pub pass: usize,
    pub fail: usize,
    pub skip: usize,
    pub todo: usize,
}

impl Tally {
    /// Skipped findings never fail; todo findings are neither pass nor fail.
    pub fn record(&mut self, report: &Report) {
        self.count += 1;
        if report.skip.is_set() {
            self.skip += 1;
        } else if report.todo.is_set() {
            self.todo += 1;
        } else if report.ok {
            self.pass += 1;
        } else {
            self.fail += 1;
        }
    }

    pub fn is_success(&self) -> bool {
        self.fail == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_serializes_as_bool_or_string() {
        assert_eq!(serde_json::to_string(&Mark::Flag(true)).unwrap(), "true");
        assert_eq!(
            serde_json::to_string(&Mark::from("flaky host")).unwrap(),
            "\"flaky host\""
        );
    }

    #[test]
    fn test_report_builder() {
        let report = Report::fail(Check::ExternalCheck, "https://example.com/")
            .expected("200 https://example.com/")
            .actual("404 https://example.com/")
            .at("https://site.test/index.html:3:9");

        assert_eq!(report.name, "external-check https://example.com/");
        assert_eq!(report.operator, "external-check");
        assert!(report.is(Check::ExternalCheck));
        assert!(!report.skip.is_set());
    }

    #[test]
    fn test_section_event_shape() {
        let event = ReportEvent::Section {
            name: "external-check".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "external-check" }));
    }
}
