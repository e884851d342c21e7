use trainer_project::{Workspace, WorkspaceId};

/// Where a persistent-module lesson stands relative to the tutorial
/// workspace. Computed once per open, then dispatched on.
/// 持久模組課程相對於教學工作區的狀態。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceDisposition {
    /// Nothing recorded yet and the caller already sits in the tutorial workspace.
    AdoptCurrent(WorkspaceId),
    /// Nothing recorded yet and the caller is elsewhere.
    Fresh,
    /// The recorded workspace was disposed or the host no longer knows it.
    Disposed,
    /// The recorded workspace is open but the caller is in another one.
    Mismatched(WorkspaceId),
    /// The recorded workspace is open and is the caller's.
    Reuse(WorkspaceId),
    /// The recorded workspace is neither open nor disposed.
    Unavailable(WorkspaceId),
}

impl WorkspaceDisposition {
    /// `recorded` is the registry's authoritative id, `recorded_state` the
    /// host's snapshot of it, `current` the caller's workspace.
    pub fn classify(
        recorded: Option<&WorkspaceId>,
        recorded_state: Option<&Workspace>,
        current: Option<&Workspace>,
        tutorial_name: &str,
    ) -> Self {
        let Some(recorded) = recorded else {
            return match current {
                Some(ws) if ws.is_named(tutorial_name) && !ws.disposed => {
                    WorkspaceDisposition::AdoptCurrent(ws.id.clone())
                }
                _ => WorkspaceDisposition::Fresh,
            };
        };
        match recorded_state {
            None => WorkspaceDisposition::Disposed,
            Some(ws) if ws.disposed => WorkspaceDisposition::Disposed,
            Some(ws) if ws.open && current.is_some_and(|cur| cur.id == ws.id) => {
                WorkspaceDisposition::Reuse(recorded.clone())
            }
            Some(ws) if ws.open => WorkspaceDisposition::Mismatched(recorded.clone()),
            Some(_) => WorkspaceDisposition::Unavailable(recorded.clone()),
        }
    }
}
