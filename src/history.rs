/// Direction for a history recall step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recall {
    Older,
    Newer,
}

/// Append-only log of submitted command lines plus a browse cursor.
/// A cursor equal to `entries.len()` means "not browsing".
#[derive(Debug)]
pub struct History {
    entries: Vec<String>,
    browse: usize,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            browse: 0,
            capacity: capacity.max(1),
        }
    }

    /// Records a submitted line. Blank lines are skipped; either way the
    /// browse cursor lands back at the bottom.
    pub fn append(&mut self, line: &str) {
        if !line.trim().is_empty() {
            self.entries.push(line.to_string());
            if self.entries.len() > self.capacity {
                self.entries.remove(0);
            }
        }
        self.browse = self.entries.len();
    }

    /// Steps the browse cursor and returns the line to display, or `None`
    /// when already at that end. Stepping Newer past the newest entry
    /// restores the empty line and parks the cursor at the bottom.
    pub fn recall(&mut self, direction: Recall) -> Option<String> {
        match direction {
            Recall::Older => {
                if self.browse == 0 {
                    return None;
                }
                self.browse -= 1;
                Some(self.entries[self.browse].clone())
            }
            Recall::Newer => {
                if self.browse >= self.entries.len() {
                    return None;
                }
                self.browse += 1;
                if self.browse == self.entries.len() {
                    Some(String::new())
                } else {
                    Some(self.entries[self.browse].clone())
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.browse = self.entries.len();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn browse_cursor(&self) -> usize {
        self.browse
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(lines: &[&str]) -> History {
        let mut history = History::new(1000);
        for line in lines {
            history.append(line);
        }
        history
    }

    #[test]
    fn test_round_trip_recovers_entries_and_empty_line() {
        let mut history = history_with(&["a", "b", "c"]);

        assert_eq!(history.recall(Recall::Older).as_deref(), Some("c"));
        assert_eq!(history.recall(Recall::Older).as_deref(), Some("b"));
        assert_eq!(history.recall(Recall::Older).as_deref(), Some("a"));

        assert_eq!(history.recall(Recall::Newer).as_deref(), Some("b"));
        assert_eq!(history.recall(Recall::Newer).as_deref(), Some("c"));
        assert_eq!(history.recall(Recall::Newer).as_deref(), Some(""));

        assert_eq!(history.entries(), &["a", "b", "c"]);
        assert_eq!(history.browse_cursor(), 3);
    }

    #[test]
    fn test_recall_is_idempotent_at_both_ends() {
        let mut history = history_with(&["a", "b"]);

        // Bottom: Newer is a no-op, cursor untouched.
        assert_eq!(history.recall(Recall::Newer), None);
        assert_eq!(history.browse_cursor(), 2);

        history.recall(Recall::Older);
        history.recall(Recall::Older);
        assert_eq!(history.browse_cursor(), 0);

        // Top: Older is a no-op, cursor untouched.
        assert_eq!(history.recall(Recall::Older), None);
        assert_eq!(history.browse_cursor(), 0);
    }

    #[test]
    fn test_recall_on_empty_history() {
        let mut history = History::new(1000);
        assert_eq!(history.recall(Recall::Older), None);
        assert_eq!(history.recall(Recall::Newer), None);
    }

    #[test]
    fn test_blank_lines_are_not_recorded() {
        let mut history = history_with(&["a", "", "   ", "b"]);
        assert_eq!(history.entries(), &["a", "b"]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new(2);
        history.append("a");
        history.append("b");
        history.append("c");
        assert_eq!(history.entries(), &["b", "c"]);
        assert_eq!(history.browse_cursor(), 2);
    }

    #[test]
    fn test_append_resets_browse_cursor() {
        let mut history = history_with(&["a", "b"]);
        history.recall(Recall::Older);
        assert_eq!(history.browse_cursor(), 1);
        history.append("c");
        assert_eq!(history.browse_cursor(), 3);
    }
}
