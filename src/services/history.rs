use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::{Candidate, HistoryEntry, Polarity};

/// Default cooldown before a disliked item may resurface
pub fn default_dislike_cooldown() -> Duration {
    Duration::hours(24)
}

/// Default minimum batch size below which callers should fetch more candidates
pub const DEFAULT_MIN_BATCH_SIZE: usize = 3;

/// Reconciles the local and remote history provenances into one canonical view
///
/// Local entries seed the map; a remote entry replaces the local one when its
/// timestamp is greater or equal. Equal timestamps resolve to remote, since
/// the remote provenance is authoritative on conflict.
///
/// Pure and stateless; remote fetch failures are the caller's concern and
/// degrade to an empty remote slice, never an error here.
pub fn merge(local: &[HistoryEntry], remote: &[HistoryEntry]) -> HashMap<String, HistoryEntry> {
    let mut merged: HashMap<String, HistoryEntry> = HashMap::with_capacity(local.len());

    for entry in local {
        merged.insert(entry.item_id.clone(), entry.clone());
    }

    for entry in remote {
        match merged.get(&entry.item_id) {
            Some(existing) if entry.timestamp < existing.timestamp => {}
            _ => {
                merged.insert(entry.item_id.clone(), entry.clone());
            }
        }
    }

    merged
}

/// Decides which candidates may be shown now, preserving input order
///
/// - No history entry: eligible.
/// - Liked before: permanently ineligible; liked items never resurface.
/// - Disliked before: eligible only once strictly more than `cooldown` has
///   elapsed since the entry's timestamp (the exact boundary is ineligible).
pub fn filter_eligible(
    history: &HashMap<String, HistoryEntry>,
    candidates: Vec<Candidate>,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|candidate| match history.get(&candidate.item_id) {
            None => true,
            Some(entry) => match entry.polarity {
                Polarity::Like => false,
                Polarity::Dislike => now - entry.timestamp > cooldown,
            },
        })
        .collect()
}

/// Advisory check that a filtered batch is too short to show
///
/// The filter never fetches more candidates itself; callers react to this.
pub fn needs_more<T>(filtered: &[T], min_batch_size: usize) -> bool {
    filtered.len() < min_batch_size
}
