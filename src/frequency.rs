//! Shapes pre-aggregated issue frequencies into chart slices
//!
//! Counts come from the service already ranked. Nothing here re-sorts or
//! re-counts: a bad backend order shows up in the chart as-is.

use crate::{ChartSlice, FrequencyEntry};

/// Number of slices shown when no limit is given
pub const DEFAULT_SLICE_LIMIT: usize = 5;

/// Labels longer than this are truncated for display
pub const MAX_LABEL_CHARS: usize = 20;

pub const ELLIPSIS: &str = "...";

/// Fixed slice palette, cycled by position
pub const PALETTE: [&str; 7] = [
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884d8", "#f07d70", "#ffcc00",
];

/// Top `limit` entries as display-ready slices, in input order.
/// Entries past the limit are dropped, not merged.
pub fn to_chart_slices(entries: &[FrequencyEntry], limit: usize) -> Vec<ChartSlice> {
    entries
        .iter()
        .take(limit)
        .enumerate()
        .map(|(position, entry)| ChartSlice {
            full_label: entry.label.clone(),
            display_label: display_label(&entry.label),
            value: entry.count,
            color_index: position % PALETTE.len(),
        })
        .collect()
}

/// Label cut to [`MAX_LABEL_CHARS`] characters plus an ellipsis
pub fn display_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MAX_LABEL_CHARS).collect();
    short.push_str(ELLIPSIS);
    short
}

pub fn palette_color(color_index: usize) -> &'static str {
    PALETTE[color_index % PALETTE.len()]
}

/// Sum of all slice values, for share-of-total display. Saturates at `u64::MAX`.
pub fn total_value(slices: &[ChartSlice]) -> u64 {
    slices.iter().fold(0u64, |total, s| total.saturating_add(s.value))
}
