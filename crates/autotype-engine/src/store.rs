//! The pending-task collection.
//!
//! All access goes through [`TaskStore`]; callers only ever see clones. A task
//! claimed for execution stays in the store, marked in flight with a
//! cancellation token, until the worker finishes it.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{
    Error, Result,
    task::{ScheduledTask, TaskDraft, TaskId},
};

struct Entry {
    task: ScheduledTask,
    /// Present while the task is executing.
    in_flight: Option<CancellationToken>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Inner {
    fn position(&self, id: TaskId) -> Option<usize> {
        self.entries.iter().position(|e| e.task.id == id)
    }
}

/// Shared, lock-protected list of pending tasks in insertion order.
#[derive(Clone, Default)]
pub struct TaskStore {
    inner: Arc<Mutex<Inner>>,
}

impl TaskStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a task.
    pub fn add(&self, draft: TaskDraft) -> Result<TaskId> {
        let mut g = self.inner.lock();
        let id = TaskId(g.next_id + 1);
        let task = draft.validate(id)?;
        g.next_id += 1;
        debug!(task = %id, at = %task.scheduled_time, target = %task.target, "task_added");
        g.entries.push(Entry {
            task,
            in_flight: None,
        });
        Ok(id)
    }

    /// Remove a task. If it is executing, its run is cancelled.
    pub fn remove(&self, id: TaskId) -> Result<ScheduledTask> {
        let mut g = self.inner.lock();
        let pos = g.position(id).ok_or(Error::TaskNotFound(id))?;
        let entry = g.entries.remove(pos);
        if let Some(token) = entry.in_flight {
            debug!(task = %id, "task_removed_in_flight");
            token.cancel();
        }
        Ok(entry.task)
    }

    /// Replace a pending task's contents, keeping its id. Rejected while the
    /// task is executing.
    pub fn edit(&self, id: TaskId, draft: TaskDraft) -> Result<()> {
        let mut g = self.inner.lock();
        let pos = g.position(id).ok_or(Error::TaskNotFound(id))?;
        if g.entries[pos].in_flight.is_some() {
            return Err(Error::TaskBusy(id));
        }
        g.entries[pos].task = draft.validate(id)?;
        debug!(task = %id, "task_edited");
        Ok(())
    }

    /// Point-in-time copy of every task.
    pub fn snapshot(&self) -> Vec<ScheduledTask> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|e| e.task.clone())
            .collect()
    }

    /// Copy of one task.
    pub fn get(&self, id: TaskId) -> Option<ScheduledTask> {
        let g = self.inner.lock();
        g.position(id).map(|i| g.entries[i].task.clone())
    }

    /// Mark a task in flight and hand out its state plus cancellation token.
    /// Returns `None` when the task is gone or already claimed.
    pub fn claim(&self, id: TaskId) -> Option<(ScheduledTask, CancellationToken)> {
        let mut g = self.inner.lock();
        let pos = g.position(id)?;
        let entry = &mut g.entries[pos];
        if entry.in_flight.is_some() {
            trace!(task = %id, "claim_already_in_flight");
            return None;
        }
        let token = CancellationToken::new();
        entry.in_flight = Some(token.clone());
        Some((entry.task.clone(), token))
    }

    /// Drop a task after execution. Returns `false` when it was already
    /// removed.
    pub fn finish(&self, id: TaskId) -> bool {
        let mut g = self.inner.lock();
        match g.position(id) {
            Some(pos) => {
                g.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Whether the task is currently executing.
    pub fn is_in_flight(&self, id: TaskId) -> bool {
        let g = self.inner.lock();
        g.position(id)
            .is_some_and(|i| g.entries[i].in_flight.is_some())
    }

    /// Number of pending tasks, including ones in flight.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use winops::WindowTarget;

    use super::*;

    fn draft(msg: &str) -> TaskDraft {
        TaskDraft::new(
            datetime!(2026-01-01 09:00 UTC),
            msg,
            WindowTarget::by_title("Notes"),
        )
    }

    #[test]
    fn ids_are_sequential_and_skip_rejected_drafts() {
        let s = TaskStore::new();
        assert_eq!(s.add(draft("a")).unwrap(), TaskId(1));
        assert!(s.add(draft("")).is_err());
        assert_eq!(s.add(draft("b")).unwrap(), TaskId(2));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn claim_is_exclusive_until_finished() {
        let s = TaskStore::new();
        let id = s.add(draft("a")).unwrap();
        let (task, _token) = s.claim(id).unwrap();
        assert_eq!(task.message, "a");
        assert!(s.is_in_flight(id));
        assert!(s.claim(id).is_none());
        assert!(s.finish(id));
        assert!(s.is_empty());
        assert!(!s.finish(id));
    }

    #[test]
    fn edit_is_rejected_in_flight() {
        let s = TaskStore::new();
        let id = s.add(draft("a")).unwrap();
        s.edit(id, draft("b")).unwrap();
        assert_eq!(s.get(id).unwrap().message, "b");
        let _claim = s.claim(id).unwrap();
        assert!(matches!(s.edit(id, draft("c")), Err(Error::TaskBusy(_))));
        assert_eq!(s.get(id).unwrap().message, "b");
    }

    #[test]
    fn removing_in_flight_task_cancels_it() {
        let s = TaskStore::new();
        let id = s.add(draft("a")).unwrap();
        let (_task, token) = s.claim(id).unwrap();
        s.remove(id).unwrap();
        assert!(token.is_cancelled());
        assert!(matches!(s.remove(id), Err(Error::TaskNotFound(_))));
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let s = TaskStore::new();
        let id = s.add(draft("a")).unwrap();
        let snap = s.snapshot();
        s.edit(id, draft("b")).unwrap();
        s.add(draft("c")).unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].message, "a");
    }
}
