use std::collections::HashMap;

use crate::models::{Domain, FeedbackEvent, Polarity, PreferenceVector, TokenWeight};
use crate::services::signals;

/// Builds a ranked preference vector from a feedback window
///
/// Only `Like` events contribute; dislikes carry no positive signal. Tokens
/// are extracted from the named signal field of each event and counted, then
/// sorted by descending count with ties broken by first-seen order. Weights
/// are normalized against the mode so all values land in (0, 1].
///
/// A pure function: the same event list always yields the same vector. An
/// empty or all-dislike window yields an empty vector; supplying a default
/// is the caller's job.
pub fn aggregate(domain: Domain, events: &[FeedbackEvent], field: &str) -> PreferenceVector {
    let mut counts: HashMap<String, (u32, usize)> = HashMap::new();
    let mut next_seen = 0usize;

    for event in events.iter().filter(|e| e.polarity == Polarity::Like) {
        for token in signals::extract(event.signal(field)) {
            let entry = counts.entry(token).or_insert_with(|| {
                let seen = next_seen;
                next_seen += 1;
                (0, seen)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(String, u32, usize)> = counts
        .into_iter()
        .map(|(token, (count, seen))| (token, count, seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let max_count = ranked.first().map(|(_, count, _)| *count).unwrap_or(0).max(1);

    let tokens = ranked
        .into_iter()
        .map(|(token, count, _)| TokenWeight {
            token,
            count,
            weight: f64::from(count) / f64::from(max_count),
        })
        .collect();

    PreferenceVector { domain, tokens }
}
