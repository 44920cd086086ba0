// GachaSniff - core/matcher.rs
//
// First-match-wins scanning of a line sequence against the rule set.
// Core layer: works on any iterator of lines, so the live logcat stream and
// in-memory fixtures go through the same code path.

use crate::core::model::{RuleSet, ScanResult};
use crate::util::constants::SCAN_PROGRESS_INTERVAL_LINES;
use crate::util::logging::preview;

/// Consume `lines` until a rule matches or the sequence ends.
///
/// Each line is tested against every rule in priority order; the first rule
/// that matches produces `ScanResult::Matched` with the matched substring as
/// the URL, and no further lines are pulled from the iterator. If the
/// iterator is exhausted first, returns `ScanResult::Exhausted`.
pub fn scan_lines<I>(lines: I, rules: &RuleSet) -> ScanResult
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut scanned: u64 = 0;

    for line in lines {
        let line = line.as_ref();
        scanned += 1;

        if let Some((rule, url)) = rules.first_match(line) {
            tracing::debug!(
                rule_id = %rule.id,
                line_number = scanned,
                line = preview(line),
                "Rule matched"
            );
            return ScanResult::Matched {
                category: rule.category.clone(),
                url: url.to_string(),
            };
        }

        if scanned % SCAN_PROGRESS_INTERVAL_LINES == 0 {
            tracing::debug!(lines = scanned, "Scanning log stream");
        }
    }

    tracing::debug!(lines = scanned, "Log stream ended without a match");
    ScanResult::Exhausted
}
