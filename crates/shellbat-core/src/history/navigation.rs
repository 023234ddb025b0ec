// Recency-ordered navigation history with a back/forward cursor

use chrono::{DateTime, Utc};

use super::entry::{HistoryEntry, Location};
use crate::utils::{eq_ignore_case, is_same_or_descendant};

pub const DEFAULT_MAX_ENTRIES: usize = 100;
pub const MIN_MAX_ENTRIES: usize = 10;
pub const MAX_MAX_ENTRIES: usize = 1000;

pub fn clamp_max_entries(max: usize) -> usize {
    max.clamp(MIN_MAX_ENTRIES, MAX_MAX_ENTRIES)
}

/// Visited locations, most recent first.
///
/// Index 0 is the newest entry. Moving "back" walks toward older entries
/// (higher indices) and moving "forward" toward newer ones.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    max_entries: usize,
    next_seq: u64,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl NavigationHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            max_entries: clamp_max_entries(max_entries),
            next_seq: 1,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Applies to the next visit; existing entries are not trimmed
    pub fn set_max_entries(&mut self, max: usize) {
        self.max_entries = clamp_max_entries(max);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|pos| self.entries.get(pos))
    }

    /// Entry older than the current one
    pub fn previous(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|pos| self.entries.get(pos + 1))
    }

    /// Entry newer than the current one
    pub fn next(&self) -> Option<&HistoryEntry> {
        self.cursor
            .and_then(|pos| pos.checked_sub(1))
            .and_then(|pos| self.entries.get(pos))
    }

    pub fn find(&self, key: &str) -> Option<&HistoryEntry> {
        self.position(key).map(|idx| &self.entries[idx])
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| eq_ignore_case(&e.location_key, key))
    }

    /// Whether visiting `key` would need an icon lookup
    pub fn needs_icon(&self, key: &str) -> bool {
        self.find(key).map_or(true, |e| e.icon_path.is_none())
    }

    /// Record a visit at `now`.
    ///
    /// Known keys get their name and time refreshed; `icon` only fills an
    /// empty icon. Returns false when nothing was recorded.
    pub fn visit(&mut self, location: &Location, icon: Option<String>, now: DateTime<Utc>) -> bool {
        if location.is_placeholder || location.key.is_empty() {
            return false;
        }

        let seq = self.take_seq();
        match self.position(&location.key) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.display_name = location.display_name.clone();
                entry.last_visited_time = now;
                entry.visit_seq = seq;
                if entry.icon_path.is_none() {
                    entry.icon_path = icon;
                }
            }
            None => self.entries.push(HistoryEntry {
                location_key: location.key.clone(),
                display_name: location.display_name.clone(),
                icon_path: icon,
                last_visited_time: now,
                visit_seq: seq,
            }),
        }

        self.sort();
        self.entries.truncate(self.max_entries);
        self.cursor = Some(0);
        true
    }

    /// Move toward older entries
    pub fn move_back(&mut self, step: usize) -> Option<&HistoryEntry> {
        let pos = self.cursor?;
        if step < 1 {
            return None;
        }
        let target = pos.saturating_add(step).min(self.entries.len() - 1);
        self.move_to(pos, target)
    }

    /// Move toward newer entries
    pub fn move_forward(&mut self, step: usize) -> Option<&HistoryEntry> {
        let pos = self.cursor?;
        if step < 1 {
            return None;
        }
        let target = pos.saturating_sub(step);
        self.move_to(pos, target)
    }

    fn move_to(&mut self, pos: usize, target: usize) -> Option<&HistoryEntry> {
        if target == pos {
            return None;
        }
        self.cursor = Some(target);
        self.entries.get(target)
    }

    pub fn remove(&mut self, entry: &HistoryEntry) -> bool {
        self.remove_key(&entry.location_key)
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(idx) => {
                self.entries.remove(idx);
                self.reclamp();
                true
            }
            None => false,
        }
    }

    /// Remove `root` and everything below it
    pub fn remove_by_key_prefix(&mut self, root: &str) -> bool {
        self.retain(|e| !is_same_or_descendant(&e.location_key, root))
    }

    /// Remove entries whose location no longer exists
    pub fn prune_missing(&mut self, mut exists: impl FnMut(&str) -> bool) -> bool {
        self.retain(|e| exists(&e.location_key))
    }

    fn retain(&mut self, mut keep: impl FnMut(&HistoryEntry) -> bool) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| keep(e));
        if self.entries.len() == before {
            return false;
        }
        self.reclamp();
        true
    }

    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.cursor = None;
        count
    }

    /// Replace every entry, e.g. with entries read from disk.
    ///
    /// Input order is kept among entries with equal times, and repeated keys
    /// keep only their most recent occurrence.
    pub fn replace_all(&mut self, entries: Vec<HistoryEntry>) {
        let count = entries.len() as u64;
        self.entries = entries;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.visit_seq = count - i as u64;
        }
        self.next_seq = count + 1;

        self.sort();
        let mut kept: Vec<HistoryEntry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if !kept
                .iter()
                .any(|k| eq_ignore_case(&k.location_key, &entry.location_key))
            {
                kept.push(entry);
            }
        }
        self.entries = kept;

        self.cursor = if self.entries.is_empty() { None } else { Some(0) };
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            b.last_visited_time
                .cmp(&a.last_visited_time)
                .then_with(|| b.visit_seq.cmp(&a.visit_seq))
        });
    }

    fn reclamp(&mut self) {
        self.cursor = match self.entries.len() {
            0 => None,
            len => Some(self.cursor.unwrap_or(0).min(len - 1)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn loc(key: &str) -> Location {
        Location::new(key, key)
    }

    fn keys(history: &NavigationHistory) -> Vec<&str> {
        history.entries().iter().map(|e| e.location_key.as_str()).collect()
    }

    fn assert_invariants(history: &NavigationHistory) {
        match history.cursor() {
            None => assert!(history.is_empty()),
            Some(pos) => assert!(pos < history.len()),
        }
        for pair in history.entries().windows(2) {
            assert!(pair[0].last_visited_time >= pair[1].last_visited_time);
        }
        for (i, a) in history.entries().iter().enumerate() {
            for b in &history.entries()[i + 1..] {
                assert!(!eq_ignore_case(&a.location_key, &b.location_key));
            }
        }
    }

    #[test]
    fn visit_back_forward_scenario() {
        let mut history = NavigationHistory::default();
        history.visit(&loc("A"), None, t(1));
        history.visit(&loc("B"), None, t(2));
        history.visit(&loc("A"), None, t(3));

        assert_eq!(keys(&history), ["A", "B"]);
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(history.current().unwrap().location_key, "A");

        assert_eq!(history.move_back(1).unwrap().location_key, "B");
        assert_eq!(history.cursor(), Some(1));
        assert_eq!(history.move_forward(1).unwrap().location_key, "A");
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn same_timestamp_visits_sort_by_sequence() {
        let mut history = NavigationHistory::default();
        history.visit(&loc("A"), None, t(0));
        history.visit(&loc("B"), None, t(0));
        history.visit(&loc("A"), None, t(0));
        assert_eq!(keys(&history), ["A", "B"]);

        history.visit(&loc("C"), None, t(0));
        assert_eq!(keys(&history), ["C", "A", "B"]);
    }

    #[test]
    fn revisit_is_case_insensitive_and_keeps_icon() {
        let mut history = NavigationHistory::default();
        history.visit(&loc("C:\\Data"), Some("folder".into()), t(1));
        history.visit(&loc("D:\\Other"), None, t(2));
        assert!(!history.needs_icon("c:\\data"));
        assert!(history.needs_icon("D:\\Other"));

        let renamed = Location::new("c:\\DATA", "Data (renamed)");
        history.visit(&renamed, Some("other".into()), t(3));

        assert_eq!(history.len(), 2);
        let first = &history.entries()[0];
        assert_eq!(first.location_key, "C:\\Data");
        assert_eq!(first.display_name, "Data (renamed)");
        assert_eq!(first.icon_path.as_deref(), Some("folder"));
        assert_eq!(first.last_visited_time, t(3));
    }

    #[test]
    fn revisit_fills_missing_icon() {
        let mut history = NavigationHistory::default();
        history.visit(&loc("A"), None, t(1));
        history.visit(&loc("A"), Some("icon.png".into()), t(2));
        assert_eq!(history.current().unwrap().icon_path.as_deref(), Some("icon.png"));
    }

    #[test]
    fn placeholder_and_empty_keys_are_ignored() {
        let mut history = NavigationHistory::default();
        assert!(!history.visit(&Location::placeholder("Desktop"), None, t(1)));
        assert!(!history.visit(&loc(""), None, t(1)));
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn visits_are_capped_to_clamped_maximum() {
        for max in [1, 10, 25, 5000] {
            let mut history = NavigationHistory::new(max);
            let cap = clamp_max_entries(max);
            for i in 0..(cap as i64 + 30) {
                history.visit(&loc(&format!("/dir/{}", i)), None, t(i));
                assert!(history.len() <= cap);
            }
            assert_invariants(&history);
            assert_eq!(history.len(), cap);
            // Oldest entries were dropped
            assert_eq!(history.entries().last().unwrap().location_key, format!("/dir/{}", 30));
        }
    }

    #[test]
    fn random_visits_keep_invariants() {
        let mut history = NavigationHistory::new(10);
        let mut state: u64 = 0x2545_f491;
        for i in 0..500 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let key = format!("/k{}", state % 23);
            let key = if i % 3 == 0 { key.to_uppercase() } else { key };
            history.visit(&loc(&key), None, t((state % 50) as i64));
            assert_eq!(history.cursor(), Some(0));
            assert_invariants(&history);
        }
    }

    #[test]
    fn revisiting_twice_keeps_length() {
        let mut history = NavigationHistory::default();
        for (i, key) in ["A", "B", "C"].iter().enumerate() {
            history.visit(&loc(key), None, t(i as i64));
        }
        history.visit(&loc("B"), None, t(10));
        let len = history.len();
        history.visit(&loc("B"), None, t(11));
        assert_eq!(history.len(), len);
        assert_eq!(history.entries()[0].location_key, "B");
    }

    #[test]
    fn moves_clamp_and_invert() {
        let mut history = NavigationHistory::default();
        for i in 0..5 {
            history.visit(&loc(&format!("{}", i)), None, t(i));
        }

        assert!(history.move_back(0).is_none());
        assert!(history.move_forward(1).is_none());

        assert_eq!(history.move_back(2).unwrap().location_key, "2");
        assert_eq!(history.previous().unwrap().location_key, "1");
        assert_eq!(history.next().unwrap().location_key, "3");
        assert_eq!(history.move_forward(2).unwrap().location_key, "4");

        assert_eq!(history.move_back(100).unwrap().location_key, "0");
        assert_eq!(history.cursor(), Some(4));
        assert!(history.move_back(1).is_none());
        assert!(history.previous().is_none());

        assert_eq!(history.move_forward(usize::MAX).unwrap().location_key, "4");
        assert!(history.next().is_none());
    }

    #[test]
    fn moves_on_empty_history_return_none() {
        let mut history = NavigationHistory::default();
        assert!(history.move_back(1).is_none());
        assert!(history.move_forward(1).is_none());
        assert!(history.current().is_none());
    }

    #[test]
    fn remove_reclamps_cursor() {
        let mut history = NavigationHistory::default();
        for key in ["A", "B", "C"] {
            history.visit(&loc(key), None, Utc::now());
        }
        history.move_back(2);
        assert_eq!(history.cursor(), Some(2));

        let oldest = history.current().unwrap().clone();
        assert!(history.remove(&oldest));
        assert!(!history.remove(&oldest));
        assert_eq!(history.cursor(), Some(1));

        assert!(history.remove_key("c"));
        assert!(history.remove_key("B"));
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn remove_by_prefix_matches_children_only() {
        let mut history = NavigationHistory::default();
        let now = Utc::now();
        for (i, key) in [
            "C:\\Data",
            "C:\\Data\\x.txt",
            "c:\\data\\sub\\y",
            "C:\\DataOther",
        ]
        .iter()
        .enumerate()
        {
            history.visit(&loc(key), None, now + Duration::seconds(i as i64));
        }

        assert!(history.remove_by_key_prefix("C:\\Data"));
        assert_eq!(keys(&history), ["C:\\DataOther"]);
        assert!(!history.remove_by_key_prefix("C:\\Data"));
        assert!(!history.remove_by_key_prefix(""));
        assert_invariants(&history);
    }

    #[test]
    fn prune_missing_uses_predicate() {
        let mut history = NavigationHistory::default();
        for (i, key) in ["/keep", "/gone", "/keep/too"].iter().enumerate() {
            history.visit(&loc(key), None, t(i as i64));
        }
        assert!(history.prune_missing(|key| key.starts_with("/keep")));
        assert_eq!(keys(&history), ["/keep/too", "/keep"]);
        assert!(!history.prune_missing(|_| true));
        assert!(history.prune_missing(|_| false));
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn clear_resets_cursor() {
        let mut history = NavigationHistory::default();
        history.visit(&loc("A"), None, t(1));
        history.visit(&loc("B"), None, t(2));
        assert_eq!(history.clear(), 2);
        assert_eq!(history.cursor(), None);
        assert_eq!(history.clear(), 0);
    }

    #[test]
    fn replace_all_sorts_and_dedupes() {
        let mut history = NavigationHistory::default();
        history.replace_all(vec![
            HistoryEntry::new("/b", "b").with_time(t(5)),
            HistoryEntry::new("/a", "a").with_time(t(9)),
            HistoryEntry::new("/A", "old a").with_time(t(1)),
            HistoryEntry::new("/c", "c").with_time(t(5)),
        ]);

        assert_eq!(keys(&history), ["/a", "/b", "/c"]);
        assert_eq!(history.cursor(), Some(0));

        // Later visits outrank loaded entries with the same time
        history.visit(&loc("/c"), None, t(9));
        assert_eq!(keys(&history), ["/c", "/a", "/b"]);

        history.replace_all(Vec::new());
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn lowering_max_applies_on_next_visit() {
        let mut history = NavigationHistory::new(50);
        for i in 0..30 {
            history.visit(&loc(&format!("/{}", i)), None, t(i));
        }
        history.set_max_entries(3);
        assert_eq!(history.max_entries(), MIN_MAX_ENTRIES);
        assert_eq!(history.len(), 30);

        history.visit(&loc("/new"), None, t(100));
        assert_eq!(history.len(), MIN_MAX_ENTRIES);
    }
}
