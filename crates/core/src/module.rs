use std::fmt;

use serde::{Deserialize, Serialize};

/// File stem used when a lesson has no owning module.
pub const FALLBACK_FILE_STEM: &str = "Test";

/// Stable identifier for a module (its display name).
/// 模組的穩定識別碼（即顯示名稱）。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backing-resource strategy shared by every lesson of a module.
/// 模組內所有課程共用的檔案策略。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Lessons live in a file of the dedicated tutorial workspace.
    #[default]
    Regular,
    /// Lessons use an ephemeral scratch document.
    Scratch,
}

/// A group of lessons sharing one backing resource.
/// 共用同一份檔案的課程群組。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    kind: ModuleKind,
}

impl Module {
    pub fn new(name: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            id: ModuleId::new(name),
            kind,
        }
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Module name with every whitespace character removed.
    /// 移除所有空白字元後的模組名稱。
    pub fn name_without_whitespace(&self) -> String {
        self.id.as_str().chars().filter(|ch| !ch.is_whitespace()).collect()
    }
}

/// Builds the backing file name for a lesson: `<ModuleName>.<ext>`, or
/// `Test.<ext>` without a module.
/// 產生課程對應的檔名。
pub fn lesson_file_name(module: Option<&Module>, extension: &str) -> String {
    let stem = module
        .map(Module::name_without_whitespace)
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_STEM.to_string());
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    }
}
