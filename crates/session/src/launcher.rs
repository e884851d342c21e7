//! Serialized, shareable front door to the orchestrator.
//! 可跨執行緒共用且串行化的入口。

use std::sync::Arc;

use parking_lot::Mutex;
use trainer_core::LessonId;
use trainer_project::WorkspaceId;

use crate::error::OpenError;
use crate::host::Host;
use crate::orchestrator::{ActivationResult, ModulesOutcome, OpenOutcome, Orchestrator};

/// Every call locks the orchestrator, so a second request blocks until the
/// one in flight returns. Collaborators invoked from inside a call must not
/// call back into the same launcher.
/// 每次呼叫都會鎖住協調器，後到的請求會等待前一個完成。
pub struct LessonLauncher<H: Host> {
    inner: Arc<Mutex<Orchestrator<H>>>,
}

impl<H: Host> Clone for LessonLauncher<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: Host> LessonLauncher<H> {
    pub fn new(orchestrator: Orchestrator<H>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(orchestrator)),
        }
    }

    pub fn open_lesson(
        &self,
        current: Option<&WorkspaceId>,
        lesson: &LessonId,
    ) -> Result<OpenOutcome, OpenError> {
        self.inner.lock().open_lesson(current, lesson)
    }

    pub fn workspace_ready(&self, workspace: &WorkspaceId) -> Vec<ActivationResult> {
        self.inner.lock().workspace_ready(workspace)
    }

    pub fn workspace_failed(&self, workspace: &WorkspaceId) -> usize {
        self.inner.lock().workspace_failed(workspace)
    }

    pub fn show_modules(&self, current: Option<&WorkspaceId>) -> Result<ModulesOutcome, OpenError> {
        self.inner.lock().show_modules(current)
    }

    pub fn complete_lesson(
        &self,
        workspace: Option<&WorkspaceId>,
        lesson: &LessonId,
        passed: bool,
    ) -> Result<Option<OpenOutcome>, OpenError> {
        self.inner.lock().complete_lesson(workspace, lesson, passed)
    }

    /// Runs `op` with exclusive access, e.g. to inspect or drive the host.
    pub fn with<R>(&self, op: impl FnOnce(&mut Orchestrator<H>) -> R) -> R {
        let mut guard = self.inner.lock();
        op(&mut *guard)
    }
}
