use std::collections::VecDeque;

/// Default number of lines kept by [`HistoryRecord`].
pub const HISTORY_CAPACITY: usize = 100;

/// In-session record of dispatched lines, oldest evicted first.
///
/// Separate from the file-backed line-editor history used for up-arrow recall;
/// this one is never written to disk.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    lines: VecDeque<String>,
    capacity: usize,
}

impl HistoryRecord {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// The last `n` lines, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &str> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for HistoryRecord {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut history = HistoryRecord::with_capacity(3);
        for line in ["a", "b", "c", "d"] {
            history.push(line);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.recent(10).collect::<Vec<_>>(), ["b", "c", "d"]);
    }

    #[test]
    fn recent_takes_the_tail() {
        let mut history = HistoryRecord::default();
        for i in 0..60 {
            history.push(format!("cmd {i}"));
        }
        let tail: Vec<_> = history.recent(50).collect();
        assert_eq!(tail.len(), 50);
        assert_eq!(tail[0], "cmd 10");
        assert_eq!(tail[49], "cmd 59");
    }
}
