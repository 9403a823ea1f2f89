use crate::room::Room;

const HISTORY_LIMIT: usize = 50;

/// Undo/redo of room-list snapshots taken before each geometry edit.
#[derive(Clone, Debug, Default)]
pub struct EditHistory {
    undo_stack: Vec<Vec<Room>>,
    redo_stack: Vec<Vec<Room>>,
}

impl EditHistory {
    pub fn push(&mut self, snapshot: Vec<Room>) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > HISTORY_LIMIT {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Returns the snapshot to restore; `current` moves to the redo stack.
    pub fn undo(&mut self, current: Vec<Room>) -> Option<Vec<Room>> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Vec<Room>) -> Option<Vec<Room>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
