use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use trainer_core::LanguageId;
use trainer_project::{Workspace, WorkspaceTemplate};

use crate::host::{HostError, Toolchain, WorkspaceHost};

/// Default name of the dedicated tutorial workspace.
pub const DEFAULT_WORKSPACE_NAME: &str = "LearnProject";

const KNOWN_EXTENSIONS: &[(&str, &str)] = &[
    ("plaintext", "txt"),
    ("java", "java"),
    ("kotlin", "kt"),
    ("python", "py"),
    ("javascript", "js"),
    ("typescript", "ts"),
    ("rust", "rs"),
    ("go", "go"),
    ("ruby", "rb"),
    ("php", "php"),
];

/// Environment problems that stop a lesson from opening.
/// 阻止課程開啟的環境問題。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvironmentProblem {
    #[error("no toolchain configured")]
    NoToolchain,
    #[error("configured toolchain is invalid")]
    InvalidToolchain,
    #[error("workspace has no module of the kind this language requires")]
    ModuleKindUnsupported,
}

/// Language/toolchain descriptor for the course being taught.
/// 課程語言與工具鏈的描述。
pub trait LanguageSupport: Send {
    fn language(&self) -> &LanguageId;

    fn display_name(&self) -> &str;

    fn default_workspace_name(&self) -> &str;

    fn file_extension(&self, language: &LanguageId) -> Option<&str>;

    fn workspace_template(&self, name: &str) -> WorkspaceTemplate {
        WorkspaceTemplate::new(name, self.language().clone())
    }

    fn check_environment(&self, toolchain: Option<&Toolchain>) -> Result<(), EnvironmentProblem>;

    /// Runs once per freshly created or loaded tutorial workspace.
    fn configure_workspace(
        &self,
        _host: &mut dyn WorkspaceHost,
        _workspace: &Workspace,
    ) -> Result<(), HostError> {
        Ok(())
    }
}

pub type ConfigureHook =
    Box<dyn Fn(&mut dyn WorkspaceHost, &Workspace) -> Result<(), HostError> + Send>;

/// Table-driven [`LanguageSupport`].
/// 以對照表實作的語言描述。
pub struct LanguageProfile {
    language: LanguageId,
    display_name: String,
    workspace_name: String,
    extensions: HashMap<String, String>,
    requires_toolchain: bool,
    configure: Option<ConfigureHook>,
}

impl LanguageProfile {
    /// Profile for a toolchain-backed language with the built-in extension table.
    pub fn new(language: LanguageId, display_name: impl Into<String>) -> Self {
        let extensions = KNOWN_EXTENSIONS
            .iter()
            .map(|(tag, ext)| (tag.to_string(), ext.to_string()))
            .collect();
        Self {
            language,
            display_name: display_name.into(),
            workspace_name: DEFAULT_WORKSPACE_NAME.to_string(),
            extensions,
            requires_toolchain: true,
            configure: None,
        }
    }

    pub fn plain_text() -> Self {
        Self::new(LanguageId::plain_text(), "Plain text").requiring_toolchain(false)
    }

    pub fn with_extension(mut self, language: &str, extension: &str) -> Self {
        self.extensions.insert(
            language.to_ascii_lowercase(),
            extension.trim_start_matches('.').to_string(),
        );
        self
    }

    pub fn with_workspace_name(mut self, name: impl Into<String>) -> Self {
        self.workspace_name = name.into();
        self
    }

    pub fn requiring_toolchain(mut self, required: bool) -> Self {
        self.requires_toolchain = required;
        self
    }

    pub fn with_configure_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn WorkspaceHost, &Workspace) -> Result<(), HostError> + Send + 'static,
    {
        self.configure = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("language", &self.language)
            .field("workspace_name", &self.workspace_name)
            .field("requires_toolchain", &self.requires_toolchain)
            .finish_non_exhaustive()
    }
}

impl LanguageSupport for LanguageProfile {
    fn language(&self) -> &LanguageId {
        &self.language
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn default_workspace_name(&self) -> &str {
        &self.workspace_name
    }

    fn file_extension(&self, language: &LanguageId) -> Option<&str> {
        self.extensions
            .get(&language.as_str().to_ascii_lowercase())
            .map(String::as_str)
    }

    fn check_environment(&self, toolchain: Option<&Toolchain>) -> Result<(), EnvironmentProblem> {
        if !self.requires_toolchain {
            return Ok(());
        }
        match toolchain {
            None => Err(EnvironmentProblem::NoToolchain),
            Some(toolchain) if !toolchain.valid => Err(EnvironmentProblem::InvalidToolchain),
            Some(toolchain) if !toolchain.language.matches(self.language.as_str()) => {
                Err(EnvironmentProblem::ModuleKindUnsupported)
            }
            Some(_) => Ok(()),
        }
    }

    fn configure_workspace(
        &self,
        host: &mut dyn WorkspaceHost,
        workspace: &Workspace,
    ) -> Result<(), HostError> {
        match &self.configure {
            Some(hook) => hook(host, workspace),
            None => Ok(()),
        }
    }
}
