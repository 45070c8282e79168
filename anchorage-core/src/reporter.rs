use crate::error::{CheckError, Result};
use crate::known_issues::{self, KnownIssue};
use crate::report::{Mark, Report, ReportEvent, Tally};
use std::sync::Arc;
use tracing::debug;

/// Decides whether a finding is skipped or todo. Return `Mark::Flag(false)`
/// to leave it alone.
pub type ReportFilter = Arc<dyn Fn(&Report) -> Mark + Send + Sync>;

/// Receives every event as soon as it has been filtered and counted.
pub type ReportSink = Arc<dyn Fn(&ReportEvent) + Send + Sync>;

/// Owns the report stream and the tally. Every check writes through it.
pub struct Reporter {
    skip_filter: Option<ReportFilter>,
    todo_filter: Option<ReportFilter>,
    known_issues: Vec<KnownIssue>,
    sink: Option<ReportSink>,
    events: Vec<ReportEvent>,
    tally: Tally,
    closed: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            skip_filter: None,
            todo_filter: None,
            known_issues: known_issues::builtin(),
            sink: None,
            events: Vec::new(),
            tally: Tally::default(),
            closed: false,
        }
    }

    pub fn with_skip_filter(mut self, filter: ReportFilter) -> Self {
        self.skip_filter = Some(filter);
        self
    }

    pub fn with_todo_filter(mut self, filter: ReportFilter) -> Self {
        self.todo_filter = Some(filter);
        self
    }

    pub fn with_known_issue(mut self, issue: KnownIssue) -> Self {
        self.known_issues.push(issue);
        self
    }

    pub fn without_known_issues(mut self) -> Self {
        self.known_issues.clear();
        self
    }

    pub fn with_sink(mut self, sink: ReportSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn push(&mut self, mut report: Report) -> Result<()> {
        if self.closed {
            return Err(CheckError::ReporterClosed);
        }

        if let Some(ref filter) = self.skip_filter {
            let mark = filter(&report);
            if mark.is_set() {
                report.skip = mark;
            }
        }

        if let Some(ref filter) = self.todo_filter {
            let mark = filter(&report);
            if mark.is_set() {
                report.todo = mark;
            }
        }

        if !report.ok
            && !report.skip.is_set()
            && let Some(issue) = self.known_issues.iter().find(|issue| issue.matches(&report))
        {
            debug!("Known issue for {}: {}", report.name, issue.reason);
            report.ok = true;
            report.skip = Mark::Reason(issue.reason.clone());
        }

        self.tally.record(&report);
        self.emit(ReportEvent::Finding(report));
        Ok(())
    }

    pub fn push_all(&mut self, reports: impl IntoIterator<Item = Report>) -> Result<()> {
        for report in reports {
            self.push(report)?;
        }
        Ok(())
    }

    pub fn push_section(&mut self, name: impl Into<String>) -> Result<()> {
        if self.closed {
            return Err(CheckError::ReporterClosed);
        }
        self.emit(ReportEvent::Section { name: name.into() });
        Ok(())
    }

    /// Finalize the tally. Further pushes are rejected; closing again
    /// returns the same tally.
    pub fn close(&mut self) -> Tally {
        self.closed = true;
        self.tally
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    pub fn findings(&self) -> impl Iterator<Item = &Report> {
        self.events.iter().filter_map(|event| match event {
            ReportEvent::Finding(report) => Some(report),
            ReportEvent::Section { .. } => None,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn emit(&mut self, event: ReportEvent) {
        if let Some(ref sink) = self.sink {
            sink(&event);
        }
        self.events.push(event);
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter matching findings whose name contains any of the patterns.
pub fn name_filter(patterns: Vec<String>) -> ReportFilter {
    Arc::new(move |report: &Report| {
        Mark::Flag(patterns.iter().any(|pattern| report.name.contains(pattern.as_str())))
    })
}
