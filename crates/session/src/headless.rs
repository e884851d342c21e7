//! Filesystem-backed host without a UI.
//!
//! Workspaces are directories under a root folder, scratch documents and
//! editors live in memory, and every prompt answer is scripted up front.
//! The CLI and the integration tests drive the orchestrator through it.
//! 以檔案系統為後端、無介面的宿主實作，供命令列與整合測試使用。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use trainer_core::LanguageId;
use trainer_project::{
    create_workspace_dir, load_workspace_dir, Resource, ResourceLocation, Workspace,
    WorkspaceError, WorkspaceId, WorkspaceTemplate,
};

use crate::host::{
    DocumentHost, EditorHandle, EditorHost, EditorId, EditorKind, HostError, Prompts, Toolchain,
    WorkspaceHost,
};

/// What `open_editor` hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Text,
    /// Only non-editable viewers can be opened.
    ViewerOnly,
    /// Editors are disposed as soon as they open.
    DisposedOnOpen,
}

/// A prompt the host was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptRecord {
    NewWorkspace(Option<WorkspaceId>),
    Toolchain { message: String, language: String },
    ModuleProblem(Option<WorkspaceId>),
}

#[derive(Debug, Clone)]
struct ScratchDocument {
    language: LanguageId,
    content: String,
    valid: bool,
}

#[derive(Debug, Clone)]
struct EditorEntry {
    handle: EditorHandle,
    disposed: bool,
}

#[derive(Debug)]
pub struct HeadlessHost {
    root: PathBuf,
    workspaces: Vec<Workspace>,
    focused: Option<WorkspaceId>,
    toolchains: HashMap<WorkspaceId, Toolchain>,
    offered_toolchain: Option<Toolchain>,
    scratches: HashMap<String, ScratchDocument>,
    editors: Vec<EditorEntry>,
    focused_editor: Option<EditorId>,
    next_editor: u64,
    editor_mode: EditorMode,
    accept_new_workspace: bool,
    prompts: Vec<PromptRecord>,
    workspaces_created: usize,
    workspaces_loaded: usize,
    editors_opened: usize,
}

impl HeadlessHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workspaces: Vec::new(),
            focused: None,
            toolchains: HashMap::new(),
            offered_toolchain: None,
            scratches: HashMap::new(),
            editors: Vec::new(),
            focused_editor: None,
            next_editor: 0,
            editor_mode: EditorMode::Text,
            accept_new_workspace: true,
            prompts: Vec::new(),
            workspaces_created: 0,
            workspaces_loaded: 0,
            editors_opened: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens (creating on disk if needed) a fully started workspace and
    /// focuses it, the way a user's own project would be.
    pub fn open_caller_workspace(&mut self, name: &str) -> Result<WorkspaceId, HostError> {
        let template = WorkspaceTemplate::new(name, LanguageId::plain_text());
        let mut workspace = self.create_or_load(&template)?;
        workspace.initialized = true;
        let id = workspace.id.clone();
        self.track(workspace);
        self.focused = Some(id.clone());
        Ok(id)
    }

    /// Marks a workspace as started. Returns `false` for unknown ids.
    pub fn finish_startup(&mut self, id: &WorkspaceId) -> bool {
        match self.entry_mut(id) {
            Some(workspace) if workspace.open && !workspace.disposed => {
                workspace.initialized = true;
                true
            }
            _ => false,
        }
    }

    /// Closes and disposes a workspace, dropping its editors.
    pub fn dispose_workspace(&mut self, id: &WorkspaceId) -> bool {
        let Some(workspace) = self.entry_mut(id) else {
            return false;
        };
        workspace.open = false;
        workspace.disposed = true;
        self.editors.retain(|entry| &entry.handle.workspace != id);
        if self.focused.as_ref() == Some(id) {
            self.focused = None;
        }
        true
    }

    /// Closes a workspace without disposing it.
    pub fn close_workspace(&mut self, id: &WorkspaceId) -> bool {
        let Some(workspace) = self.entry_mut(id) else {
            return false;
        };
        workspace.open = false;
        if self.focused.as_ref() == Some(id) {
            self.focused = None;
        }
        true
    }

    pub fn set_toolchain(&mut self, workspace: &WorkspaceId, toolchain: Option<Toolchain>) {
        match toolchain {
            Some(toolchain) => {
                self.toolchains.insert(workspace.clone(), toolchain);
            }
            None => {
                self.toolchains.remove(workspace);
            }
        }
    }

    /// Answer given to every "open a new workspace?" prompt.
    pub fn answer_workspace_prompt(&mut self, accept: bool) {
        self.accept_new_workspace = accept;
    }

    /// Toolchain applied whenever a selection prompt is shown; `None`
    /// makes the prompt report a decline.
    pub fn offer_toolchain(&mut self, toolchain: Option<Toolchain>) {
        self.offered_toolchain = toolchain;
    }

    pub fn set_editor_mode(&mut self, mode: EditorMode) {
        self.editor_mode = mode;
    }

    /// Marks a scratch document invalid, as if it was deleted externally.
    pub fn invalidate_scratch(&mut self, name: &str) -> bool {
        match self.scratches.get_mut(name) {
            Some(doc) => {
                doc.valid = false;
                true
            }
            None => false,
        }
    }

    pub fn scratch_language(&self, name: &str) -> Option<&LanguageId> {
        self.scratches.get(name).map(|doc| &doc.language)
    }

    pub fn scratch_content(&self, name: &str) -> Option<&str> {
        self.scratches.get(name).map(|doc| doc.content.as_str())
    }

    pub fn prompts(&self) -> &[PromptRecord] {
        &self.prompts
    }

    /// Live editors, in opening order.
    pub fn editors(&self) -> Vec<EditorHandle> {
        self.editors
            .iter()
            .filter(|entry| !entry.disposed)
            .map(|entry| entry.handle.clone())
            .collect()
    }

    pub fn focused_editor(&self) -> Option<EditorId> {
        self.focused_editor
    }

    pub fn workspaces_created(&self) -> usize {
        self.workspaces_created
    }

    pub fn workspaces_loaded(&self) -> usize {
        self.workspaces_loaded
    }

    pub fn editors_opened(&self) -> usize {
        self.editors_opened
    }

    fn entry_mut(&mut self, id: &WorkspaceId) -> Option<&mut Workspace> {
        self.workspaces.iter_mut().find(|ws| &ws.id == id)
    }

    fn track(&mut self, workspace: Workspace) {
        self.workspaces.retain(|ws| ws.id != workspace.id);
        self.workspaces.push(workspace);
    }

    fn create_or_load(&mut self, template: &WorkspaceTemplate) -> Result<Workspace, HostError> {
        match create_workspace_dir(&self.root, template) {
            Ok(workspace) => {
                self.workspaces_created += 1;
                Ok(workspace)
            }
            Err(WorkspaceError::AlreadyExists(base)) => {
                debug!(path = %base.display(), "workspace directory exists; loading it");
                self.workspaces_loaded += 1;
                Ok(load_workspace_dir(&base)?)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl WorkspaceHost for HeadlessHost {
    fn open_workspaces(&self) -> Vec<Workspace> {
        self.workspaces
            .iter()
            .filter(|ws| ws.open && !ws.disposed)
            .cloned()
            .collect()
    }

    fn workspace(&self, id: &WorkspaceId) -> Option<Workspace> {
        self.workspaces.iter().find(|ws| &ws.id == id).cloned()
    }

    fn focused_workspace(&self) -> Option<WorkspaceId> {
        self.focused.clone()
    }

    fn focus_workspace(&mut self, id: &WorkspaceId) -> Result<(), HostError> {
        match self.workspaces.iter().find(|ws| &ws.id == id) {
            Some(ws) if ws.open && !ws.disposed => {
                self.focused = Some(id.clone());
                Ok(())
            }
            _ => Err(HostError::UnknownWorkspace(id.clone())),
        }
    }

    fn load_workspace(&mut self, path: &Path) -> Result<Workspace, HostError> {
        let workspace = load_workspace_dir(path)?;
        self.workspaces_loaded += 1;
        self.focused = Some(workspace.id.clone());
        self.track(workspace.clone());
        Ok(workspace)
    }

    fn create_workspace(&mut self, template: &WorkspaceTemplate) -> Result<Workspace, HostError> {
        let workspace = self.create_or_load(template)?;
        self.focused = Some(workspace.id.clone());
        self.track(workspace.clone());
        Ok(workspace)
    }

    fn toolchain(&self, workspace: &WorkspaceId) -> Option<Toolchain> {
        self.toolchains.get(workspace).cloned()
    }
}

impl DocumentHost for HeadlessHost {
    fn find_scratch(&self, name: &str) -> Option<Resource> {
        self.scratches
            .get(name)
            .map(|doc| Resource::scratch(name, doc.language.clone()))
    }

    fn create_scratch(
        &mut self,
        name: &str,
        language: &LanguageId,
        content: &str,
    ) -> Result<Resource, HostError> {
        self.scratches.insert(
            name.to_string(),
            ScratchDocument {
                language: language.clone(),
                content: content.to_string(),
                valid: true,
            },
        );
        Ok(Resource::scratch(name, language.clone()))
    }

    fn retag_scratch(&mut self, resource: &Resource, language: &LanguageId) -> Result<(), HostError> {
        let doc = self
            .scratches
            .get_mut(resource.name())
            .ok_or_else(|| HostError::UnknownScratch(resource.name().to_string()))?;
        doc.language = language.clone();
        Ok(())
    }

    fn is_valid(&self, resource: &Resource) -> bool {
        match resource.location() {
            ResourceLocation::Scratch { name } => {
                self.scratches.get(name).is_some_and(|doc| doc.valid)
            }
            ResourceLocation::File { path } => path.exists(),
        }
    }
}

impl EditorHost for HeadlessHost {
    fn editors_for(&self, workspace: &WorkspaceId, resource: &Resource) -> Vec<EditorHandle> {
        self.editors
            .iter()
            .filter(|entry| {
                !entry.disposed
                    && &entry.handle.workspace == workspace
                    && &entry.handle.resource == resource.location()
            })
            .map(|entry| entry.handle.clone())
            .collect()
    }

    fn open_editor(
        &mut self,
        workspace: &WorkspaceId,
        resource: &Resource,
        focus: bool,
    ) -> Result<Vec<EditorHandle>, HostError> {
        if !self.workspaces.iter().any(|ws| &ws.id == workspace && ws.open) {
            return Err(HostError::UnknownWorkspace(workspace.clone()));
        }
        self.next_editor += 1;
        self.editors_opened += 1;
        let kind = match self.editor_mode {
            EditorMode::ViewerOnly => EditorKind::Viewer,
            EditorMode::Text | EditorMode::DisposedOnOpen => EditorKind::Text,
        };
        let handle = EditorHandle {
            id: EditorId(self.next_editor),
            kind,
            workspace: workspace.clone(),
            resource: resource.location().clone(),
        };
        self.editors.push(EditorEntry {
            handle: handle.clone(),
            disposed: self.editor_mode == EditorMode::DisposedOnOpen,
        });
        if focus {
            self.focused_editor = Some(handle.id);
        }
        Ok(vec![handle])
    }

    fn close_editors(&mut self, resource: &Resource) {
        self.editors
            .retain(|entry| &entry.handle.resource != resource.location());
    }

    fn is_disposed(&self, editor: &EditorHandle) -> bool {
        self.editors
            .iter()
            .find(|entry| entry.handle.id == editor.id)
            .map_or(true, |entry| entry.disposed)
    }

    fn focus_editor(&mut self, editor: &EditorHandle) -> Result<(), HostError> {
        if self.is_disposed(editor) {
            return Err(HostError::Other(format!("editor {} is gone", editor.id.0)));
        }
        self.focused_editor = Some(editor.id);
        Ok(())
    }
}

impl Prompts for HeadlessHost {
    fn confirm_new_workspace(&mut self, current: Option<&WorkspaceId>) -> bool {
        self.prompts
            .push(PromptRecord::NewWorkspace(current.cloned()));
        self.accept_new_workspace
    }

    fn select_toolchain(
        &mut self,
        workspace: Option<&WorkspaceId>,
        message: &str,
        language: &str,
    ) -> bool {
        self.prompts.push(PromptRecord::Toolchain {
            message: message.to_string(),
            language: language.to_string(),
        });
        let Some(toolchain) = self.offered_toolchain.clone() else {
            return false;
        };
        if let Some(workspace) = workspace {
            self.toolchains.insert(workspace.clone(), toolchain);
        }
        true
    }

    fn show_module_problem(&mut self, workspace: Option<&WorkspaceId>) {
        self.prompts
            .push(PromptRecord::ModuleProblem(workspace.cloned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn caller_workspace_is_started_and_focused() {
        let tmp = tempdir().unwrap();
        let mut host = HeadlessHost::new(tmp.path());
        let id = host.open_caller_workspace("Scratchpad").unwrap();
        assert_eq!(host.focused_workspace(), Some(id.clone()));
        let ws = host.workspace(&id).unwrap();
        assert!(ws.is_ready());
        assert!(tmp.path().join("Scratchpad").join("src").is_dir());
    }

    #[test]
    fn disposed_workspaces_are_not_listed_as_open() {
        let tmp = tempdir().unwrap();
        let mut host = HeadlessHost::new(tmp.path());
        let id = host.open_caller_workspace("Scratchpad").unwrap();
        assert!(host.dispose_workspace(&id));
        assert!(host.open_workspaces().is_empty());
        assert!(host.workspace(&id).unwrap().disposed);
        assert!(host.focus_workspace(&id).is_err());
    }

    #[test]
    fn viewer_only_mode_yields_read_only_handles() {
        let tmp = tempdir().unwrap();
        let mut host = HeadlessHost::new(tmp.path());
        let id = host.open_caller_workspace("Scratchpad").unwrap();
        host.set_editor_mode(EditorMode::ViewerOnly);
        let resource = host
            .create_scratch("Learning", &LanguageId::plain_text(), "")
            .unwrap();
        let handles = host.open_editor(&id, &resource, true).unwrap();
        assert!(handles.iter().all(|h| !h.is_editable()));
    }
}
