//! In-memory FIFO queue.

use std::collections::VecDeque;

use super::TaskQueue;
use crate::error::Result;
use crate::task::Task;

/// In-process FIFO queue
#[derive(Debug, Default, Clone)]
pub struct MemoryQueue {
    tasks: VecDeque<Task>,
}

impl MemoryQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending tasks, head first
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }
}

impl TaskQueue for MemoryQueue {
    fn push(&mut self, task: Task) -> Result<()> {
        self.tasks.push_back(task);
        Ok(())
    }

    fn pop(&mut self) -> Result<Option<Task>> {
        Ok(self.tasks.pop_front())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.tasks.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl FromIterator<Task> for MemoryQueue {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}
