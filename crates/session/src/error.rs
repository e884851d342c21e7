use std::io;

use thiserror::Error;
use trainer_core::{CourseError, LanguageId, LessonId};

use crate::host::HostError;
use crate::language::EnvironmentProblem;

/// Reasons a lesson open did not complete.
///
/// Every variant is non-fatal for the host: the orchestrator logs it and the
/// lesson simply stays closed.
/// 課程未能開啟的原因；皆不會使宿主程序中止。
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("lesson '{0}' is already open")]
    LessonAlreadyOpen(LessonId),
    #[error("lesson '{0}' has no module")]
    MissingModule(LessonId),
    #[error("lesson '{0}' is not part of the course")]
    UnknownLesson(LessonId),
    #[error("no toolchain configured")]
    NoToolchain,
    #[error("configured toolchain is invalid")]
    InvalidToolchain,
    #[error("module kind is not supported by the configured toolchain")]
    ModuleKindUnsupported,
    #[error("no editable editor for '{0}'")]
    EditorUnavailable(String),
    #[error("unable to establish the tutorial workspace: {0}")]
    WorkspaceUnavailable(String),
    #[error("no file extension known for language '{0}'")]
    UnknownLanguage(LanguageId),
    #[error("failed to create lesson file '{name}': {source}")]
    ResourceCreation {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Course(#[from] CourseError),
}

impl OpenError {
    /// Problems a toolchain selection can fix.
    pub fn is_recoverable_toolchain(&self) -> bool {
        matches!(self, OpenError::NoToolchain | OpenError::InvalidToolchain)
    }
}

impl From<EnvironmentProblem> for OpenError {
    fn from(problem: EnvironmentProblem) -> Self {
        match problem {
            EnvironmentProblem::NoToolchain => OpenError::NoToolchain,
            EnvironmentProblem::InvalidToolchain => OpenError::InvalidToolchain,
            EnvironmentProblem::ModuleKindUnsupported => OpenError::ModuleKindUnsupported,
        }
    }
}
