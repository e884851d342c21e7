use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
pub use trainer_core::WorkspaceId;
use trainer_core::LanguageId;

use crate::util::{current_timestamp, write_atomic};

/// File name of the descriptor stored at a workspace base path.
pub const DESCRIPTOR_FILE: &str = "workspace.json";

/// Host-side view of a workspace at one point in time.
///
/// `base_path` stays `None` until the workspace has been written to disk.
/// 宿主環境中工作區的即時快照；尚未建立於磁碟前 `base_path` 為 `None`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub base_path: Option<PathBuf>,
    pub content_roots: Vec<PathBuf>,
    pub open: bool,
    pub disposed: bool,
    /// Startup activities have finished.
    pub initialized: bool,
}

impl Workspace {
    /// Creates an open, not yet initialized workspace.  
    /// 建立已開啟但尚未完成啟動的工作區。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkspaceId::new(),
            name: name.into(),
            base_path: None,
            content_roots: Vec::new(),
            open: true,
            disposed: false,
            initialized: false,
        }
    }

    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn with_content_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.content_roots.push(root.into());
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    /// Open, started and not disposed.
    pub fn is_ready(&self) -> bool {
        self.open && self.initialized && !self.disposed
    }

    pub fn first_content_root(&self) -> Option<&Path> {
        self.content_roots.first().map(PathBuf::as_path)
    }
}

/// Blueprint for a freshly created tutorial workspace.  
/// 新建教學工作區的範本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceTemplate {
    pub name: String,
    pub language: LanguageId,
    /// Content root relative to the base path.
    pub source_root: String,
}

impl WorkspaceTemplate {
    pub fn new(name: impl Into<String>, language: LanguageId) -> Self {
        Self {
            name: name.into(),
            language,
            source_root: "src".to_string(),
        }
    }
}

/// Descriptor persisted at the workspace base path.  
/// 儲存在工作區根目錄的描述檔。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceDescriptor {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub language: LanguageId,
    #[serde(default)]
    pub content_roots: Vec<String>,
    #[serde(default)]
    pub last_used_unix: Option<i64>,
}

/// Errors raised by workspace persistence.  
/// 工作區儲存相關的錯誤。
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid workspace descriptor {path}: {reason}")]
    InvalidDescriptor { path: PathBuf, reason: String },
    #[error("invalid workspace state file {path}: {reason}")]
    InvalidState { path: PathBuf, reason: String },
    #[error("no workspace found at {0}")]
    NotFound(PathBuf),
    #[error("workspace directory {0} already exists")]
    AlreadyExists(PathBuf),
}

/// Creates `<parent>/<template.name>` with its content root and descriptor.
/// The returned workspace is open but not yet initialized.  
/// 依範本在 `parent` 下建立工作區目錄與描述檔。
pub fn create_workspace_dir(
    parent: &Path,
    template: &WorkspaceTemplate,
) -> Result<Workspace, WorkspaceError> {
    let base = parent.join(&template.name);
    if base.join(DESCRIPTOR_FILE).exists() {
        return Err(WorkspaceError::AlreadyExists(base));
    }
    let source_root = base.join(&template.source_root);
    fs::create_dir_all(&source_root)?;

    let descriptor = WorkspaceDescriptor {
        id: WorkspaceId::new(),
        name: template.name.clone(),
        language: template.language.clone(),
        content_roots: vec![template.source_root.clone()],
        last_used_unix: Some(current_timestamp()),
    };
    save_descriptor(&base, &descriptor)?;
    debug!(workspace = %descriptor.id, path = %base.display(), "workspace directory created");
    Ok(workspace_from_descriptor(&base, descriptor))
}

/// Loads a workspace previously written by [`create_workspace_dir`],
/// refreshing its last-used timestamp.  
/// 載入既有的工作區目錄並更新最近使用時間。
pub fn load_workspace_dir(base: &Path) -> Result<Workspace, WorkspaceError> {
    let path = base.join(DESCRIPTOR_FILE);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(WorkspaceError::NotFound(base.to_path_buf()))
        }
        Err(err) => return Err(WorkspaceError::Io(err)),
    };
    let mut descriptor: WorkspaceDescriptor =
        serde_json::from_str(&contents).map_err(|err| WorkspaceError::InvalidDescriptor {
            path: path.clone(),
            reason: err.to_string(),
        })?;
    descriptor.last_used_unix = Some(current_timestamp());
    save_descriptor(base, &descriptor)?;
    Ok(workspace_from_descriptor(base, descriptor))
}

fn save_descriptor(base: &Path, descriptor: &WorkspaceDescriptor) -> Result<(), WorkspaceError> {
    let path = base.join(DESCRIPTOR_FILE);
    let json =
        serde_json::to_vec_pretty(descriptor).map_err(|err| WorkspaceError::InvalidDescriptor {
            path: path.clone(),
            reason: err.to_string(),
        })?;
    write_atomic(&path, &json)?;
    Ok(())
}

fn workspace_from_descriptor(base: &Path, descriptor: WorkspaceDescriptor) -> Workspace {
    Workspace {
        id: descriptor.id,
        name: descriptor.name,
        base_path: Some(base.to_path_buf()),
        content_roots: descriptor
            .content_roots
            .iter()
            .map(|root| base.join(root))
            .collect(),
        open: true,
        disposed: false,
        initialized: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_load_workspace_directory() {
        let tmp = tempdir().unwrap();
        let template = WorkspaceTemplate::new("LearnProject", LanguageId::from("java"));
        let created = create_workspace_dir(tmp.path(), &template).unwrap();
        assert_eq!(created.name, "LearnProject");
        assert!(created.open && !created.initialized);
        let root = created.first_content_root().unwrap();
        assert!(root.ends_with("LearnProject/src"));
        assert!(root.is_dir());

        let loaded = load_workspace_dir(created.base_path.as_deref().unwrap()).unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.content_roots, created.content_roots);
    }

    #[test]
    fn creating_over_existing_workspace_fails() {
        let tmp = tempdir().unwrap();
        let template = WorkspaceTemplate::new("LearnProject", LanguageId::plain_text());
        create_workspace_dir(tmp.path(), &template).unwrap();
        let err = create_workspace_dir(tmp.path(), &template).unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));
    }

    #[test]
    fn loading_missing_directory_is_not_found() {
        let tmp = tempdir().unwrap();
        let err = load_workspace_dir(&tmp.path().join("gone")).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound(_)));
    }

    #[test]
    fn readiness_requires_startup_and_no_disposal() {
        let mut workspace = Workspace::new("LearnProject");
        assert!(!workspace.is_ready());
        workspace.initialized = true;
        assert!(workspace.is_ready());
        workspace.disposed = true;
        assert!(!workspace.is_ready());
    }
}
