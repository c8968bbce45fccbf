//! Undo/Redo command stack.
//!
//! Every scene mutation is recorded as a whole-scene snapshot pair, so undo
//! and redo replace the document in a single step. A drag gesture commits
//! once, which makes it exactly one entry.

use mdr_core::Scene;

/// Snapshots taken either side of one mutation.
#[derive(Debug, Clone)]
pub struct Command {
    before: Scene,
    after: Scene,
    description: String,
}

impl Command {
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Manages undo/redo stacks with bounded depth.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(128)),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Record a mutation. Nothing is pushed when the scene did not change.
    /// Returns whether an entry was recorded.
    pub fn record(&mut self, before: Scene, after: &Scene, description: &str) -> bool {
        if before == *after || self.max_depth == 0 {
            return false;
        }
        self.undo_stack.push(Command {
            before,
            after: after.clone(),
            description: description.to_string(),
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
        log::debug!("recorded `{description}` ({} undo)", self.undo_stack.len());
        true
    }

    /// Undo the last command, restoring its `before` snapshot.
    pub fn undo(&mut self, scene: &mut Scene) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        scene.clone_from(&cmd.before);
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command.
    pub fn redo(&mut self, scene: &mut Scene) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        scene.clone_from(&cmd.after);
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
