use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use trainer_core::ModuleId;
use trainer_project::{Resource, Workspace, WorkspaceError, WorkspaceId, WorkspaceLocationStore};

/// Session state shared by the orchestrator and its resolvers: the
/// authoritative tutorial workspace, its path, and the module→resource map.
///
/// Only the path is durable, and only when a [`WorkspaceLocationStore`] is
/// attached.
/// 工作階段狀態：權威教學工作區、其路徑以及模組與文件的對應。
#[derive(Debug, Default)]
pub struct SessionRegistry {
    workspace: Option<WorkspaceId>,
    workspace_path: Option<PathBuf>,
    resources: HashMap<ModuleId, Resource>,
    store: Option<WorkspaceLocationStore>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the recorded workspace path from `store`.
    /// 從儲存區還原先前記錄的工作區路徑。
    pub fn with_store(store: WorkspaceLocationStore) -> Result<Self, WorkspaceError> {
        let workspace_path = store.load()?;
        if let Some(path) = &workspace_path {
            debug!(path = %path.display(), "restored tutorial workspace location");
        }
        Ok(Self {
            workspace_path,
            store: Some(store),
            ..Self::default()
        })
    }

    pub fn workspace(&self) -> Option<&WorkspaceId> {
        self.workspace.as_ref()
    }

    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace_path.as_deref()
    }

    /// Makes `id` authoritative without touching the recorded path.
    pub fn adopt_workspace(&mut self, id: WorkspaceId) {
        self.workspace = Some(id);
    }

    /// Makes `workspace` authoritative and records its base path. A failed
    /// write is logged; the in-memory state is updated regardless.
    /// 設定權威工作區並記錄其路徑；寫入失敗僅記錄警告。
    pub fn record_workspace(&mut self, workspace: &Workspace) {
        self.workspace = Some(workspace.id.clone());
        if workspace.base_path.is_none() {
            return;
        }
        self.workspace_path = workspace.base_path.clone();
        if let Some(store) = &self.store {
            if let Err(err) = store.save(self.workspace_path.as_deref()) {
                warn!(error = %err, path = %store.path().display(), "failed to persist tutorial workspace location");
            }
        }
    }

    pub fn resource(&self, module: &ModuleId) -> Option<&Resource> {
        self.resources.get(module)
    }

    pub fn register_resource(&mut self, module: ModuleId, resource: Resource) {
        debug!(module = %module, resource = resource.name(), "registered module resource");
        self.resources.insert(module, resource);
    }

    pub fn forget_resource(&mut self, module: &ModuleId) -> Option<Resource> {
        self.resources.remove(module)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&ModuleId, &Resource)> {
        self.resources.iter()
    }
}
