use std::collections::HashMap;

use crate::models::LoadTimeStats;

/// Occurrence counter that remembers first-seen order.
///
/// `most_frequent` breaks ties in favour of the key inserted first, so the
/// result never depends on hash iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `key`
    pub fn record(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn count(&self, key: &str) -> u64 {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Key with the highest count; the earliest inserted key wins a tie
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        let mut best: Option<(&str, u64)> = None;
        for (key, count) in self.iter() {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((key, count)),
            }
        }
        best
    }

    /// The `n` highest counts, ties kept in first-seen order
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut sorted: Vec<_> = self.iter().collect();
        // stable sort keeps insertion order among equal counts
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }
}

/// Min, arithmetic mean and max of a sample set. `None` when empty.
pub fn load_time_stats(samples: &[i64]) -> Option<LoadTimeStats> {
    let min_ms = *samples.iter().min()?;
    let max_ms = *samples.iter().max()?;
    let total: i128 = samples.iter().map(|&s| s as i128).sum();
    Some(LoadTimeStats {
        min_ms,
        mean_ms: total as f64 / samples.len() as f64,
        max_ms,
    })
}
