//! Session establishment for interactive lessons.
//!
//! Given a requested lesson and whatever state the host is in, the
//! orchestrator converges on a tutorial workspace, a backing document and a
//! live editor before handing the lesson to the execution engine.
//! 互動課程的工作階段建立：在交付執行引擎前，確保教學工作區、課程文件與可編輯的編輯器皆已就緒。

mod activation;
mod binder;
mod disposition;
mod error;
pub mod headless;
pub mod host;
mod initializer;
pub mod language;
mod launcher;
pub mod listeners;
mod orchestrator;
mod registry;
mod resolver;

pub use activation::{ActivationHandle, ActivationQueue, Continuation};
pub use binder::bind_editor;
pub use disposition::WorkspaceDisposition;
pub use error::OpenError;
pub use headless::{EditorMode, HeadlessHost, PromptRecord};
pub use host::{
    DocumentHost, EditorHandle, EditorHost, EditorId, EditorKind, Host, HostError, Prompts,
    Toolchain, WorkspaceHost,
};
pub use initializer::{ensure_workspace, InitRequest};
pub use language::{
    EnvironmentProblem, LanguageProfile, LanguageSupport, DEFAULT_WORKSPACE_NAME,
};
pub use launcher::LessonLauncher;
pub use listeners::{
    attach_listener, CompletionRecord, ListenerFactories, ListenerFactory, ProgressionListener,
    StatisticsListener, StatisticsLog,
};
pub use orchestrator::{
    ActivationResult, BoundLesson, ExecutionEngine, LoggingEngine, ModulesOutcome, NoPresentation,
    OpenOutcome, Orchestrator, Presentation,
};
pub use registry::SessionRegistry;
pub use resolver::{resolve_in_workspace, resolve_scratch};
