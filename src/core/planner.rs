//! Plan output parsing — extracts the resource-count summary.

use super::types::PlanSummary;
use regex::Regex;
use std::sync::OnceLock;

fn summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Plan: (?:\d+ to import, )?(\d+) to add, (\d+) to change, (\d+) to destroy\.")
            .unwrap_or_else(|e| unreachable!("summary regex is a literal: {e}"))
    })
}

/// Parse the summary line from `terraform plan` stdout.
///
/// `No changes.` yields an all-zero summary. Returns `None` when the output
/// carries neither form.
pub fn parse_plan_summary(stdout: &str) -> Option<PlanSummary> {
    if let Some(caps) = summary_re().captures(stdout) {
        let n = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        return Some(PlanSummary {
            to_add: n(1)?,
            to_change: n(2)?,
            to_destroy: n(3)?,
        });
    }
    if stdout.contains("No changes.") {
        return Some(PlanSummary::default());
    }
    None
}
