//! Collaborator interfaces the host editing environment implements.
//! 宿主編輯環境需要實作的協作介面。

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use trainer_core::LanguageId;
use trainer_project::{
    create_file_atomic, find_in_content_roots, Resource, ResourceLocation, Workspace,
    WorkspaceError, WorkspaceId, WorkspaceTemplate,
};

/// Failure reported by a host collaborator.
/// 宿主協作元件回報的錯誤。
#[derive(Debug, Error)]
pub enum HostError {
    #[error("workspace {0} is not known to the host")]
    UnknownWorkspace(WorkspaceId),
    #[error("scratch document '{0}' does not exist")]
    UnknownScratch(String),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error("host I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(String),
}

/// Toolchain (SDK) configured for a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub name: String,
    pub language: LanguageId,
    pub valid: bool,
}

impl Toolchain {
    pub fn new(name: impl Into<String>, language: LanguageId) -> Self {
        Self {
            name: name.into(),
            language,
            valid: true,
        }
    }
}

/// Opaque editor identifier assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    Text,
    /// Read-only surface (preview, diff, image).
    Viewer,
}

/// Live editor surface showing a resource.
/// 顯示某份文件的編輯器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorHandle {
    pub id: EditorId,
    pub kind: EditorKind,
    pub workspace: WorkspaceId,
    pub resource: ResourceLocation,
}

impl EditorHandle {
    pub fn is_editable(&self) -> bool {
        self.kind == EditorKind::Text
    }
}

/// Workspace (project) management.
/// 工作區管理。
pub trait WorkspaceHost {
    fn open_workspaces(&self) -> Vec<Workspace>;

    /// Snapshot of a known workspace, open or disposed.
    fn workspace(&self, id: &WorkspaceId) -> Option<Workspace>;

    fn focused_workspace(&self) -> Option<WorkspaceId>;

    fn focus_workspace(&mut self, id: &WorkspaceId) -> Result<(), HostError>;

    fn load_workspace(&mut self, path: &Path) -> Result<Workspace, HostError>;

    fn create_workspace(&mut self, template: &WorkspaceTemplate) -> Result<Workspace, HostError>;

    fn toolchain(&self, workspace: &WorkspaceId) -> Option<Toolchain>;

    /// Automated mode: never prompt.
    fn is_headless(&self) -> bool {
        false
    }
}

/// Backing documents: scratch storage and workspace files.
/// 課程文件：暫存文件與工作區檔案。
pub trait DocumentHost {
    fn find_scratch(&self, name: &str) -> Option<Resource>;

    fn create_scratch(
        &mut self,
        name: &str,
        language: &LanguageId,
        content: &str,
    ) -> Result<Resource, HostError>;

    /// Re-applies the language mapping of a scratch document.
    fn retag_scratch(&mut self, resource: &Resource, language: &LanguageId)
        -> Result<(), HostError>;

    fn is_valid(&self, resource: &Resource) -> bool;

    fn find_content_entry(&self, workspace: &Workspace, name: &str) -> Option<PathBuf> {
        find_in_content_roots(&workspace.content_roots, name)
    }

    /// Creates an empty file; must leave nothing behind on failure.
    fn create_content_file(&mut self, root: &Path, name: &str) -> io::Result<PathBuf> {
        create_file_atomic(root, name)
    }
}

/// Editor surfaces.
/// 編輯器管理。
pub trait EditorHost {
    fn editors_for(&self, workspace: &WorkspaceId, resource: &Resource) -> Vec<EditorHandle>;

    fn open_editor(
        &mut self,
        workspace: &WorkspaceId,
        resource: &Resource,
        focus: bool,
    ) -> Result<Vec<EditorHandle>, HostError>;

    fn close_editors(&mut self, resource: &Resource);

    fn is_disposed(&self, editor: &EditorHandle) -> bool;

    fn focus_editor(&mut self, editor: &EditorHandle) -> Result<(), HostError>;
}

/// Modal prompts shown to the user.
/// 顯示給使用者的對話框。
pub trait Prompts {
    /// `false` aborts the open silently.
    fn confirm_new_workspace(&mut self, current: Option<&WorkspaceId>) -> bool;

    /// Returns whether a toolchain was chosen and applied to `workspace`.
    fn select_toolchain(
        &mut self,
        workspace: Option<&WorkspaceId>,
        message: &str,
        language: &str,
    ) -> bool;

    fn show_module_problem(&mut self, workspace: Option<&WorkspaceId>);
}

/// Everything the orchestrator needs from the host.
pub trait Host: WorkspaceHost + DocumentHost + EditorHost + Prompts + Send {}

impl<T> Host for T where T: WorkspaceHost + DocumentHost + EditorHost + Prompts + Send {}
