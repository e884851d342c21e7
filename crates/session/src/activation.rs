//! One-shot continuations fired when a workspace finishes starting up.
//! 工作區啟動完成時觸發的一次性後續動作。

use tracing::debug;
use trainer_core::LessonId;
use trainer_project::WorkspaceId;

/// Handle for cancelling a scheduled activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivationHandle(u64);

/// Work resumed once the workspace is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Show the lesson view and re-run the full open for this lesson.
    OpenLesson(LessonId),
    /// Show the module list.
    ShowModules,
}

#[derive(Debug)]
struct Pending {
    handle: ActivationHandle,
    workspace: WorkspaceId,
    continuation: Continuation,
}

/// Pending activations keyed by workspace. Each registration runs at most
/// once; there is no timeout.
/// 依工作區排隊的待執行動作，每筆最多執行一次且不設逾時。
#[derive(Debug, Default)]
pub struct ActivationQueue {
    next_id: u64,
    pending: Vec<Pending>,
}

impl ActivationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `continuation` for `workspace`. An identical pending
    /// registration is reused rather than duplicated.
    pub fn schedule_when_ready(
        &mut self,
        workspace: WorkspaceId,
        continuation: Continuation,
    ) -> ActivationHandle {
        if let Some(existing) = self
            .pending
            .iter()
            .find(|p| p.workspace == workspace && p.continuation == continuation)
        {
            return existing.handle;
        }
        self.next_id += 1;
        let handle = ActivationHandle(self.next_id);
        debug!(workspace = %workspace, ?continuation, "activation scheduled");
        self.pending.push(Pending {
            handle,
            workspace,
            continuation,
        });
        handle
    }

    pub fn cancel(&mut self, handle: ActivationHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        before != self.pending.len()
    }

    pub fn is_pending(&self, handle: ActivationHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    /// Removes and returns every continuation for `workspace`, in
    /// registration order.
    pub fn take_ready(&mut self, workspace: &WorkspaceId) -> Vec<Continuation> {
        let (ready, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| &p.workspace == workspace);
        self.pending = rest;
        ready.into_iter().map(|p| p.continuation).collect()
    }

    /// Drops every registration for a workspace that failed to start.
    pub fn discard(&mut self, workspace: &WorkspaceId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| &p.workspace != workspace);
        before - self.pending.len()
    }

    pub fn pending_for(&self, workspace: &WorkspaceId) -> usize {
        self.pending
            .iter()
            .filter(|p| &p.workspace == workspace)
            .count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(name: &str) -> Continuation {
        Continuation::OpenLesson(LessonId::new(name))
    }

    #[test]
    fn continuations_fire_once_per_registration() {
        let mut queue = ActivationQueue::new();
        let learn = WorkspaceId::from_string("learn");
        let other = WorkspaceId::from_string("other");
        queue.schedule_when_ready(learn.clone(), open("Select"));
        queue.schedule_when_ready(other.clone(), Continuation::ShowModules);
        queue.schedule_when_ready(learn.clone(), Continuation::ShowModules);

        assert_eq!(
            queue.take_ready(&learn),
            vec![open("Select"), Continuation::ShowModules]
        );
        assert!(queue.take_ready(&learn).is_empty());
        assert_eq!(queue.pending_for(&other), 1);
    }

    #[test]
    fn duplicate_registration_returns_same_handle() {
        let mut queue = ActivationQueue::new();
        let learn = WorkspaceId::from_string("learn");
        let first = queue.schedule_when_ready(learn.clone(), open("Select"));
        let second = queue.schedule_when_ready(learn.clone(), open("Select"));
        assert_eq!(first, second);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn cancelled_and_discarded_registrations_never_fire() {
        let mut queue = ActivationQueue::new();
        let learn = WorkspaceId::from_string("learn");
        let handle = queue.schedule_when_ready(learn.clone(), open("Select"));
        assert!(queue.cancel(handle));
        assert!(!queue.is_pending(handle));
        assert!(!queue.cancel(handle));

        queue.schedule_when_ready(learn.clone(), open("Undo"));
        assert_eq!(queue.discard(&learn), 1);
        assert!(queue.take_ready(&learn).is_empty());
        assert!(queue.is_empty());
    }
}
