//! Record lists and frequency lists

use super::{decode_tagged, log_fallback, Tagged};
use crate::{CommonIssues, FrequencyEntry, IssueReport};
use serde_json::Value;

pub const COMMON_AST_KEY: &str = "common_AST_Issues";
pub const COMMON_STYLE_KEY: &str = "common_PEP8_Issues";

/// Decode a list of history records, one report per element.
///
/// Accepts an array, a single record object (treated as a one-element list),
/// or the same encoded as JSON text. Sentinel records are kept; filtering them
/// is the caller's decision.
pub fn decode_records(raw: &Value) -> Vec<IssueReport> {
    let payload = Tagged::wire(raw).unwrap_once(|v| v.is_array() || v.is_object());
    let decoded: Vec<_> = if payload.value.is_array() {
        payload.items().map(decode_tagged).collect()
    } else if payload.as_object().is_some() {
        vec![decode_tagged(payload)]
    } else {
        tracing::warn!("record list payload is neither an array nor an object");
        Vec::new()
    };

    decoded
        .into_iter()
        .map(|(report, problem)| {
            if let Some(problem) = problem {
                log_fallback(&report, &problem);
            }
            report
        })
        .collect()
}

/// Decode the common-issues payload into its two frequency lists.
///
/// Entries are `[label, count]` pairs; malformed entries are skipped. A
/// missing list is empty. Backend order is preserved.
pub fn decode_common_issues(raw: &Value) -> CommonIssues {
    let payload = Tagged::wire(raw).unwrap_once(Value::is_object);
    if payload.as_object().is_none() {
        tracing::warn!("common issues payload is not an object");
        return CommonIssues::default();
    }
    CommonIssues {
        ast: frequency_list(payload.field(COMMON_AST_KEY)),
        style: frequency_list(payload.field(COMMON_STYLE_KEY)),
    }
}

fn frequency_list(field: Option<Tagged<'_>>) -> Vec<FrequencyEntry> {
    let Some(field) = field else {
        return Vec::new();
    };
    let field = field.unwrap_once(Value::is_array);
    field
        .items()
        .filter_map(|item| {
            let entry = frequency_entry(&item.value);
            if entry.is_none() {
                tracing::debug!(entry = %item.value, "skipping malformed frequency entry");
            }
            entry
        })
        .collect()
}

fn frequency_entry(value: &Value) -> Option<FrequencyEntry> {
    let pair = value.as_array()?;
    let [label, count, ..] = pair.as_slice() else {
        return None;
    };
    let label = label.as_str()?;
    let count = count.as_u64()?;
    Some(FrequencyEntry::new(label, count))
}
