use crate::state::board::{Board, PLAYER_COUNT, PlayerId};

/// Committed copy of the versioned part of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Board cells at commit time.
    pub board: Board,
    /// Scores at commit time.
    pub scores: [i32; PLAYER_COUNT],
    /// Player allowed to pick the next clue.
    pub choosing: PlayerId,
    /// Players that had already attempted the clue in play.
    pub responded: [bool; PLAYER_COUNT],
}

/// Undo stack of committed snapshots. Never empty.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Start a log whose floor is `initial`.
    pub fn new(initial: HistoryEntry) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    /// Record a committed snapshot.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Drop `steps` entries from the tail and return the entry now on top.
    ///
    /// The oldest entry is always kept. Returns `None` without touching the log when `steps`
    /// is zero or larger than the number of entries.
    pub fn rollback(&mut self, steps: usize) -> Option<&HistoryEntry> {
        if steps == 0 || steps > self.entries.len() {
            return None;
        }

        let keep = self.entries.len().saturating_sub(steps).max(1);
        self.entries.truncate(keep);
        self.entries.last()
    }

    /// Forget everything and start again from `entry`.
    pub fn reset(&mut self, entry: HistoryEntry) {
        self.entries.clear();
        self.entries.push(entry);
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(log: &HistoryLog) -> &HistoryEntry {
        log.entries.last().unwrap()
    }

    fn entry(score: i32) -> HistoryEntry {
        HistoryEntry {
            board: Board::new(),
            scores: [score, 0, 0, 0],
            choosing: PlayerId::default(),
            responded: [false; PLAYER_COUNT],
        }
    }

    #[test]
    fn rollback_returns_new_tail() {
        let mut log = HistoryLog::new(entry(0));
        log.push(entry(100));
        log.push(entry(300));

        assert_eq!(log.rollback(1).map(|e| e.scores[0]), Some(100));
        assert_eq!(log.len(), 2);
        assert_eq!(top(&log).scores[0], 100);
    }

    #[test]
    fn rollback_keeps_the_floor() {
        let mut log = HistoryLog::new(entry(0));
        log.push(entry(100));

        assert_eq!(log.rollback(2).map(|e| e.scores[0]), Some(0));
        assert_eq!(log.len(), 1);
        assert_eq!(log.rollback(1).map(|e| e.scores[0]), Some(0));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn rollback_past_depth_is_rejected() {
        let mut log = HistoryLog::new(entry(0));
        log.push(entry(100));

        assert!(log.rollback(3).is_none());
        assert!(log.rollback(0).is_none());
        assert_eq!(log.len(), 2);
        assert_eq!(top(&log).scores[0], 100);
    }

    #[test]
    fn pushed_entries_are_independent_copies() {
        let mut live = entry(0);
        let mut log = HistoryLog::new(live.clone());
        live.scores[0] = 500;
        log.push(live.clone());
        live.scores[0] = 900;

        assert_eq!(top(&log).scores[0], 500);
    }

    #[test]
    fn reset_leaves_a_single_entry() {
        let mut log = HistoryLog::new(entry(0));
        log.push(entry(100));
        log.push(entry(200));
        log.reset(entry(7));

        assert_eq!(log.len(), 1);
        assert_eq!(top(&log).scores[0], 7);
        assert!(!log.is_empty());
    }
}
