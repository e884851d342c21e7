use std::path::{Path, PathBuf};

use trainer_core::LanguageId;

use crate::workspace::WorkspaceId;

/// Where a backing document lives; this is its identity.  
/// 文件所在位置，即其識別。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceLocation {
    /// Ephemeral document outside any workspace.
    Scratch { name: String },
    /// File or directory inside a workspace content root.
    File { path: PathBuf },
}

/// Backing document for a module's lessons.
///
/// Equality is by location; the language tag may be re-applied without
/// changing identity.  
/// 模組課程所用的文件；以位置判斷是否相同。
#[derive(Debug, Clone)]
pub struct Resource {
    location: ResourceLocation,
    language: LanguageId,
    workspace: Option<WorkspaceId>,
}

impl Resource {
    pub fn scratch(name: impl Into<String>, language: LanguageId) -> Self {
        Self {
            location: ResourceLocation::Scratch { name: name.into() },
            language,
            workspace: None,
        }
    }

    pub fn file(path: impl Into<PathBuf>, language: LanguageId, workspace: WorkspaceId) -> Self {
        Self {
            location: ResourceLocation::File { path: path.into() },
            language,
            workspace: Some(workspace),
        }
    }

    pub fn location(&self) -> &ResourceLocation {
        &self.location
    }

    /// File name, or the scratch document name.
    pub fn name(&self) -> &str {
        match &self.location {
            ResourceLocation::Scratch { name } => name,
            ResourceLocation::File { path } => path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            ResourceLocation::File { path } => Some(path),
            ResourceLocation::Scratch { .. } => None,
        }
    }

    pub fn is_scratch(&self) -> bool {
        matches!(self.location, ResourceLocation::Scratch { .. })
    }

    pub fn language(&self) -> &LanguageId {
        &self.language
    }

    pub fn set_language(&mut self, language: LanguageId) {
        self.language = language;
    }

    /// Owning workspace; `None` for scratch documents.
    pub fn workspace(&self) -> Option<&WorkspaceId> {
        self.workspace.as_ref()
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

impl Eq for Resource {}
