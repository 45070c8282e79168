// TAP version 13 rendering of the report stream

use crate::report::{Report, ReportEvent, Tally};

pub const TAP_VERSION: &str = "TAP version 13";

/// Renders events one at a time, numbering findings as it goes.
#[derive(Debug, Default)]
pub struct TapRenderer {
    number: usize,
}

impl TapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> &'static str {
        TAP_VERSION
    }

    /// Lines for one event, without a trailing newline.
    pub fn render(&mut self, event: &ReportEvent) -> String {
        match event {
            ReportEvent::Section { name } => format!("# {}", name),
            ReportEvent::Finding(report) => {
                self.number += 1;
                self.render_finding(report)
            }
        }
    }

    fn render_finding(&self, report: &Report) -> String {
        let status = if report.ok { "ok" } else { "not ok" };
        let mut line = format!("{} {} - {}", status, self.number, report.name);

        if report.skip.is_set() {
            line.push_str(" # SKIP");
            if let Some(reason) = report.skip.reason() {
                line.push(' ');
                line.push_str(reason);
            }
        } else if report.todo.is_set() {
            line.push_str(" # TODO");
            if let Some(reason) = report.todo.reason() {
                line.push(' ');
                line.push_str(reason);
            }
        }

        if !report.ok {
            line.push('\n');
            line.push_str(&diagnostics(report));
        }
        line
    }

    /// Plan and totals, rendered after the last event.
    pub fn summary(&self, tally: &Tally) -> String {
        [
            format!("1..{}", tally.count),
            format!("# tests {}", tally.count),
            format!("# pass  {}", tally.pass),
            format!("# fail  {}", tally.fail),
            format!("# skip  {}", tally.skip),
            format!("# todo  {}", tally.todo),
        ]
        .join("\n")
    }
}

/// The YAML block under a failing finding. Values are written as JSON
/// strings, which YAML reads unchanged.
fn diagnostics(report: &Report) -> String {
    let mut block = vec!["  ---".to_string()];
    block.push(format!("  operator: {}", report.operator));
    if let Some(ref expected) = report.expected {
        block.push(format!("  expected: {}", quote(expected)));
    }
    if let Some(ref actual) = report.actual {
        block.push(format!("  actual:   {}", quote(actual)));
    }
    if !report.at.is_empty() {
        block.push(format!("  at: {}", quote(&report.at)));
    }
    block.push("  ...".to_string());
    block.join("\n")
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}
