//! Undo/redo over deep snapshots of the object collection.

use crate::objects::AnnotationObject;

/// A full copy of the collection.
pub type Snapshot = Vec<AnnotationObject>;

/// Undo and redo stacks of snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the pre-mutation state. Clears the redo stack.
    pub fn push(&mut self, current: &[AnnotationObject]) {
        self.undo_stack.push(current.to_vec());
        self.redo_stack.clear();

        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last snapshot, saving `current` for redo.
    pub fn undo(&mut self, current: &[AnnotationObject]) -> Option<Snapshot> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(current.to_vec());
        Some(snapshot)
    }

    /// Pop the last undone snapshot, saving `current` for undo.
    pub fn redo(&mut self, current: &[AnnotationObject]) -> Option<Snapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(current.to_vec());
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Score, Text};
    use kurbo::Point;

    fn text(content: &str) -> AnnotationObject {
        AnnotationObject::Text(Text::new(0, Point::ZERO, content.to_string()))
    }

    #[test]
    fn test_undo_redo_mirror() {
        let mut history = History::new(10);
        let before = vec![text("a")];
        let after = vec![text("a"), AnnotationObject::Score(Score::new(0, Point::ZERO, 2))];

        history.push(&before);
        let restored = history.undo(&after).unwrap();
        assert_eq!(restored, before);
        assert!(history.can_redo());

        let again = history.redo(&restored).unwrap();
        assert_eq!(again, after);
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new(10);
        history.push(&[]);
        history.undo(&[text("x")]);
        assert!(history.can_redo());
        history.push(&[]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(2);
        history.push(&[text("1")]);
        history.push(&[text("2")]);
        history.push(&[text("3")]);
        assert_eq!(history.undo_depth(), 2);
        let last = history.undo(&[]).unwrap();
        let first = history.undo(&last).unwrap();
        assert_eq!(first[0].as_text().unwrap().content, "2");
        assert!(history.undo(&first).is_none());
    }

    #[test]
    fn test_empty_undo_is_noop() {
        let mut history = History::default();
        assert!(history.undo(&[]).is_none());
        assert!(history.redo(&[]).is_none());
    }
}
