//! Ranking of counter maps and report formatting.
//!
//! Rankings are derived, read-only views over a [`StatsAggregate`]; nothing
//! here mutates or re-aggregates. The report text is free-form and not a
//! compatibility surface.
//!
//! # Example
//!
//! ```
//! use indexmap::IndexMap;
//! use mailbox_stats::report::{rank_descending, top_n};
//!
//! let mut counts = IndexMap::new();
//! counts.insert("a@example.com".to_string(), 2);
//! counts.insert("b@example.com".to_string(), 1);
//! counts.insert("c@example.com".to_string(), 2);
//!
//! let ranked = rank_descending(&counts);
//! // Ties keep first-insertion order: a before c
//! assert_eq!(ranked[0].0, "a@example.com");
//! assert_eq!(ranked[1].0, "c@example.com");
//! assert_eq!(top_n(&ranked, 2).len(), 2);
//! ```

use crate::error::{Error, Result};
use crate::stats::StatsAggregate;
use indexmap::IndexMap;
use std::fmt::Write;

/// Ranks a counter map by count, descending.
///
/// The sort is stable: keys with equal counts keep the relative order in
/// which they were first inserted into the map.
#[must_use]
pub fn rank_descending(counts: &IndexMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = counts
        .iter()
        .map(|(key, &count)| (key.clone(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Truncates a ranking to its first `n` entries.
///
/// Returns fewer entries when the ranking is shorter; `n == 0` yields an
/// empty slice.
#[must_use]
pub fn top_n(ranked: &[(String, u64)], n: usize) -> &[(String, u64)] {
    &ranked[..ranked.len().min(n)]
}

/// Arithmetic mean of a size sample.
///
/// # Errors
///
/// Returns [`Error::EmptyDataset`] for an empty sample - the division by
/// zero is caught here rather than surfacing as NaN downstream.
pub fn average_size(sizes: &[u64]) -> Result<f64> {
    if sizes.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let total: u64 = sizes.iter().sum();
    #[allow(clippy::cast_precision_loss)]
    let average = total as f64 / sizes.len() as f64;
    Ok(average)
}

/// Formats a human-readable summary of an aggregate.
///
/// The report contains the total message count, the average size, the top-5
/// senders and tags, and full dumps of both counter maps. Pure composition
/// over the other functions of this module - no new aggregation logic.
///
/// # Errors
///
/// Returns [`Error::EmptyDataset`] when the aggregate holds no messages, or
/// [`Error::Serialize`] if a counter dump cannot be serialized.
pub fn format_report(aggregate: &StatsAggregate) -> Result<String> {
    let avg = average_size(aggregate.sizes())?;
    let senders = rank_descending(aggregate.sender_counts());
    let tags = rank_descending(aggregate.tag_counts());

    let tag_dump = serde_json::to_string(aggregate.tag_counts())
        .map_err(|source| Error::Serialize { source })?;
    let sender_dump = serde_json::to_string(aggregate.sender_counts())
        .map_err(|source| Error::Serialize { source })?;

    let mut out = String::new();
    let w = &mut out;
    // Writing into a String cannot fail
    let _ = writeln!(w, "Mailbox statistics");
    let _ = writeln!(w, "------------------");
    let _ = writeln!(w, "Total messages : {}", aggregate.message_count());
    let _ = writeln!(w, "Average size   : {:.2} KiB", avg / 1024.0);
    let _ = writeln!(w, "Top 5 senders  : {}", format_ranked(top_n(&senders, 5)));
    let _ = writeln!(w, "Top 5 tags     : {}", format_ranked(top_n(&tags, 5)));
    let _ = writeln!(w, "Tag counts     : {tag_dump}");
    let _ = writeln!(w, "Sender counts  : {sender_dump}");

    Ok(out)
}

/// Renders ranked entries as "key (count), key (count), ...".
fn format_ranked(entries: &[(String, u64)]) -> String {
    entries
        .iter()
        .map(|(key, count)| format!("{key} ({count})"))
        .collect::<Vec<_>>()
        .join(", ")
}
