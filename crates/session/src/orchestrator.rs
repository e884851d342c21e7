//! Lesson-open decision tree and its recovery branches.
//! 開啟課程的決策流程與錯誤復原。

use std::fmt;

use tracing::{debug, error, info, warn};
use trainer_core::{Course, Lesson, LessonId, ListenerEffect, ModuleKind};
use trainer_project::{Resource, Workspace, WorkspaceId};
use trainer_settings::TrainerSettings;

use crate::activation::{ActivationHandle, ActivationQueue, Continuation};
use crate::binder::bind_editor;
use crate::disposition::WorkspaceDisposition;
use crate::error::OpenError;
use crate::host::{EditorHandle, Host};
use crate::initializer::{ensure_workspace, InitRequest};
use crate::language::LanguageSupport;
use crate::listeners::{ListenerFactories, StatisticsLog};
use crate::registry::SessionRegistry;
use crate::resolver::{resolve_in_workspace, resolve_scratch};

/// Walks a lesson once an editor is bound.
/// 編輯器就緒後負責執行課程步驟的引擎。
pub trait ExecutionEngine: Send {
    fn process(&mut self, workspace: &WorkspaceId, lesson: &Lesson, editor: &EditorHandle);
}

/// Engine that only logs the handoff.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEngine;

impl ExecutionEngine for LoggingEngine {
    fn process(&mut self, workspace: &WorkspaceId, lesson: &Lesson, editor: &EditorHandle) {
        info!(lesson = %lesson.id(), workspace = %workspace, editor = editor.id.0, "lesson handed to execution engine");
    }
}

/// Tool-window side of the trainer. Every hook defaults to a no-op.
/// 工具視窗介面；預設皆不做事。
pub trait Presentation: Send {
    /// Returns `false` when the tool window is unavailable.
    fn show_tool_window(&mut self, _workspace: &WorkspaceId) -> bool {
        true
    }

    fn show_lesson_view(&mut self) {}

    fn show_modules_view(&mut self, _workspace: &WorkspaceId) {}

    fn clear_lesson_panel(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoPresentation;

impl Presentation for NoPresentation {}

/// Everything the execution engine received at handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundLesson {
    pub lesson: LessonId,
    pub workspace: WorkspaceId,
    pub resource: Resource,
    pub editor: EditorHandle,
}

/// Result of a lesson-open request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The lesson is open with a live editor.
    Started(BoundLesson),
    /// The tutorial workspace is still starting; the open resumes from
    /// [`Orchestrator::workspace_ready`].
    Deferred {
        workspace: WorkspaceId,
        handle: ActivationHandle,
    },
    /// The user declined a prompt. Nothing is reported.
    Aborted,
}

impl OpenOutcome {
    pub fn bound(&self) -> Option<&BoundLesson> {
        match self {
            OpenOutcome::Started(bound) => Some(bound),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModulesOutcome {
    Shown(WorkspaceId),
    Deferred {
        workspace: WorkspaceId,
        handle: ActivationHandle,
    },
    Aborted,
}

/// What a fired continuation produced.
#[derive(Debug)]
pub enum ActivationResult {
    Lesson {
        lesson: LessonId,
        result: Result<OpenOutcome, OpenError>,
    },
    Modules(WorkspaceId),
    /// The tool window could not be shown, so the continuation did nothing.
    Skipped(Continuation),
}

enum Initialized {
    Declined,
    Ready(Workspace),
    Scheduled {
        workspace: WorkspaceId,
        handle: ActivationHandle,
    },
}

enum WorkspaceStep {
    Ready(Workspace),
    Finished(OpenOutcome),
}

/// Drives a lesson from "requested" to "handed to the engine".
///
/// The orchestrator owns the session registry and the pending activations;
/// callers that may be reached from several threads should go through
/// [`crate::LessonLauncher`] instead of sharing this directly.
/// 負責將課程從「請求開啟」推進到「交付執行引擎」。
pub struct Orchestrator<H: Host> {
    host: H,
    course: Course,
    language: Box<dyn LanguageSupport>,
    engine: Box<dyn ExecutionEngine>,
    presentation: Box<dyn Presentation>,
    settings: TrainerSettings,
    registry: SessionRegistry,
    activations: ActivationQueue,
    listeners: ListenerFactories,
    statistics: StatisticsLog,
}

impl<H: Host> Orchestrator<H> {
    pub fn new<L>(host: H, course: Course, language: L, settings: TrainerSettings) -> Self
    where
        L: LanguageSupport + 'static,
    {
        let statistics = StatisticsLog::new();
        Self {
            host,
            course,
            language: Box::new(language),
            engine: Box::new(LoggingEngine),
            presentation: Box::new(NoPresentation),
            settings,
            registry: SessionRegistry::new(),
            activations: ActivationQueue::new(),
            listeners: ListenerFactories::builtin(statistics.clone()),
            statistics,
        }
    }

    pub fn with_registry(mut self, registry: SessionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_engine<E>(mut self, engine: E) -> Self
    where
        E: ExecutionEngine + 'static,
    {
        self.engine = Box::new(engine);
        self
    }

    pub fn with_presentation<P>(mut self, presentation: P) -> Self
    where
        P: Presentation + 'static,
    {
        self.presentation = Box::new(presentation);
        self
    }

    /// Replaces the listener factories; statistics keep going to the
    /// orchestrator's log only if `listeners` was built from it.
    pub fn with_listeners(mut self, listeners: ListenerFactories) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn activations(&self) -> &ActivationQueue {
        &self.activations
    }

    pub fn settings(&self) -> &TrainerSettings {
        &self.settings
    }

    pub fn statistics(&self) -> &StatisticsLog {
        &self.statistics
    }

    /// Name the tutorial workspace is recognized by.
    pub fn tutorial_workspace_name(&self) -> String {
        self.settings
            .workspace_name_or(self.language.default_workspace_name())
            .to_string()
    }

    /// Opens `lesson` on behalf of a caller focused on `current`.
    ///
    /// Toolchain problems prompt for a toolchain and retry from the top, at
    /// most `max_toolchain_retries` times. Every `Err` has already been
    /// logged; the caller may simply drop it.
    /// 開啟課程；工具鏈問題會提示選擇並自頂端重試，次數有上限。
    pub fn open_lesson(
        &mut self,
        current: Option<&WorkspaceId>,
        lesson: &LessonId,
    ) -> Result<OpenOutcome, OpenError> {
        let mut retries = 0;
        loop {
            let err = match self.attempt(current, lesson) {
                Ok(outcome) => return Ok(outcome),
                Err(err) => err,
            };

            if err.is_recoverable_toolchain() {
                if retries >= self.settings.max_toolchain_retries {
                    error!(lesson = %lesson, retries, error = %err, "giving up after repeated toolchain selection");
                    return Err(err);
                }
                retries += 1;
                let message = format!(
                    "{err}. Select a {} toolchain to continue.",
                    self.language.display_name()
                );
                let display = self.language.display_name().to_string();
                let prompt_ws = self.scratch_host(current);
                if !self
                    .host
                    .select_toolchain(prompt_ws.as_ref(), &message, &display)
                {
                    info!(lesson = %lesson, "toolchain selection declined; open aborted");
                    return Ok(OpenOutcome::Aborted);
                }
                debug!(lesson = %lesson, attempt = retries, "toolchain selected; retrying open");
                continue;
            }

            match &err {
                OpenError::ModuleKindUnsupported => {
                    let problem_ws = self.scratch_host(current);
                    self.host.show_module_problem(problem_ws.as_ref());
                    warn!(lesson = %lesson, "module kind not supported by the configured toolchain");
                }
                OpenError::LessonAlreadyOpen(_) => {
                    warn!(lesson = %lesson, "lesson is already open");
                }
                _ => {
                    error!(lesson = %lesson, error = %err, "lesson open did not complete");
                }
            }
            return Err(err);
        }
    }

    /// Workspace a scratch document is shown in, and whose toolchain the
    /// environment check reads.
    fn scratch_host(&self, current: Option<&WorkspaceId>) -> Option<WorkspaceId> {
        current.or(self.registry.workspace()).cloned()
    }

    fn attempt(
        &mut self,
        current: Option<&WorkspaceId>,
        lesson_id: &LessonId,
    ) -> Result<OpenOutcome, OpenError> {
        let lesson = self
            .course
            .lesson(lesson_id)
            .ok_or_else(|| OpenError::UnknownLesson(lesson_id.clone()))?;
        if lesson.is_open() {
            return Err(OpenError::LessonAlreadyOpen(lesson_id.clone()));
        }
        let language = lesson.language().clone();
        let module = self
            .course
            .module_of(lesson_id)
            .cloned()
            .ok_or_else(|| OpenError::MissingModule(lesson_id.clone()))?;

        let (workspace, resource) = match module.kind() {
            ModuleKind::Scratch => {
                let workspace = self.scratch_host(current).ok_or_else(|| {
                    OpenError::WorkspaceUnavailable(
                        "no workspace to show the scratch document in".to_string(),
                    )
                })?;
                let toolchain = self.host.toolchain(&workspace);
                self.language.check_environment(toolchain.as_ref())?;
                debug!(lesson = %lesson_id, module = %module.id(), "resolving scratch document");
                let resource = resolve_scratch(
                    &mut self.host,
                    &mut self.registry,
                    module.id(),
                    &language,
                    &self.settings.scratch_file_name,
                )?;
                (workspace, resource)
            }
            ModuleKind::Regular => {
                let extension = self
                    .language
                    .file_extension(&language)
                    .ok_or_else(|| OpenError::UnknownLanguage(language.clone()))?
                    .to_string();
                let workspace = match self.resolve_workspace(current, lesson_id)? {
                    WorkspaceStep::Ready(workspace) => workspace,
                    WorkspaceStep::Finished(outcome) => return Ok(outcome),
                };
                let resource = resolve_in_workspace(
                    &mut self.host,
                    &mut self.registry,
                    &module,
                    &language,
                    &extension,
                    &workspace,
                )?;
                (workspace.id, resource)
            }
        };

        self.hand_off(lesson_id, workspace, resource)
    }

    fn resolve_workspace(
        &mut self,
        current: Option<&WorkspaceId>,
        lesson: &LessonId,
    ) -> Result<WorkspaceStep, OpenError> {
        let recorded = self.registry.workspace().cloned();
        let recorded_state = recorded.as_ref().and_then(|id| self.host.workspace(id));
        let current_state = current.and_then(|id| self.host.workspace(id));
        let tutorial_name = self.tutorial_workspace_name();
        let disposition = WorkspaceDisposition::classify(
            recorded.as_ref(),
            recorded_state.as_ref(),
            current_state.as_ref(),
            &tutorial_name,
        );
        debug!(lesson = %lesson, ?disposition, "workspace disposition");

        match disposition {
            WorkspaceDisposition::AdoptCurrent(id) => {
                let workspace = current_state.ok_or_else(|| unavailable(&id))?;
                info!(workspace = %id, "adopting caller workspace as tutorial workspace");
                self.registry.adopt_workspace(id);
                Ok(WorkspaceStep::Ready(workspace))
            }
            WorkspaceDisposition::Fresh | WorkspaceDisposition::Disposed => {
                let continuation = Continuation::OpenLesson(lesson.clone());
                match self.initialize(current, continuation)? {
                    Initialized::Declined => Ok(WorkspaceStep::Finished(OpenOutcome::Aborted)),
                    Initialized::Ready(workspace) => {
                        if self.presentation.show_tool_window(&workspace.id) {
                            self.presentation.show_lesson_view();
                        }
                        Ok(WorkspaceStep::Ready(workspace))
                    }
                    Initialized::Scheduled { workspace, handle } => {
                        Ok(WorkspaceStep::Finished(OpenOutcome::Deferred { workspace, handle }))
                    }
                }
            }
            WorkspaceDisposition::Mismatched(id) | WorkspaceDisposition::Reuse(id) => {
                let workspace = recorded_state.ok_or_else(|| unavailable(&id))?;
                Ok(WorkspaceStep::Ready(workspace))
            }
            WorkspaceDisposition::Unavailable(id) => Err(unavailable(&id)),
        }
    }

    /// Runs the initializer and, when the workspace is not ready yet, parks
    /// `continuation` until [`Self::workspace_ready`] fires for it.
    fn initialize(
        &mut self,
        current: Option<&WorkspaceId>,
        continuation: Continuation,
    ) -> Result<Initialized, OpenError> {
        let tutorial_name = self.tutorial_workspace_name();
        let request = InitRequest {
            hint: current,
            tutorial_name: &tutorial_name,
            headless: self.settings.headless || self.host.is_headless(),
        };
        let Some(workspace) = ensure_workspace(
            &mut self.host,
            &mut self.registry,
            self.language.as_ref(),
            request,
        )?
        else {
            info!("tutorial workspace declined; nothing opened");
            return Ok(Initialized::Declined);
        };

        if workspace.is_ready() {
            debug!(workspace = %workspace.id, "tutorial workspace already started");
            return Ok(Initialized::Ready(workspace));
        }
        let handle = self
            .activations
            .schedule_when_ready(workspace.id.clone(), continuation);
        info!(workspace = %workspace.id, "waiting for tutorial workspace startup");
        Ok(Initialized::Scheduled {
            workspace: workspace.id,
            handle,
        })
    }

    fn hand_off(
        &mut self,
        lesson_id: &LessonId,
        workspace: WorkspaceId,
        resource: Resource,
    ) -> Result<OpenOutcome, OpenError> {
        let lesson = self
            .course
            .lesson_mut(lesson_id)
            .ok_or_else(|| OpenError::UnknownLesson(lesson_id.clone()))?;
        self.listeners.attach_all(lesson, &workspace);

        let editor = bind_editor(&mut self.host, &workspace, &resource)?;

        self.presentation.show_lesson_view();
        self.course.start_lesson(lesson_id)?;
        self.presentation.clear_lesson_panel();
        let lesson = self
            .course
            .lesson(lesson_id)
            .ok_or_else(|| OpenError::UnknownLesson(lesson_id.clone()))?;
        self.engine.process(&workspace, lesson, &editor);
        info!(
            lesson = %lesson_id,
            workspace = %workspace,
            resource = resource.name(),
            "lesson opened"
        );

        Ok(OpenOutcome::Started(BoundLesson {
            lesson: lesson_id.clone(),
            workspace,
            resource,
            editor,
        }))
    }

    /// Fires every continuation parked on `workspace`, each at most once.
    /// 觸發等待此工作區的所有後續動作，每筆僅一次。
    pub fn workspace_ready(&mut self, workspace: &WorkspaceId) -> Vec<ActivationResult> {
        let ready = self.activations.take_ready(workspace);
        if ready.is_empty() {
            debug!(workspace = %workspace, "workspace ready with nothing pending");
        }
        ready
            .into_iter()
            .map(|continuation| self.run_continuation(workspace, continuation))
            .collect()
    }

    /// Drops continuations for a workspace that will never finish starting.
    pub fn workspace_failed(&mut self, workspace: &WorkspaceId) -> usize {
        let dropped = self.activations.discard(workspace);
        if dropped > 0 {
            warn!(workspace = %workspace, dropped, "tutorial workspace failed to start; pending opens dropped");
        }
        dropped
    }

    fn run_continuation(
        &mut self,
        workspace: &WorkspaceId,
        continuation: Continuation,
    ) -> ActivationResult {
        debug!(workspace = %workspace, ?continuation, "running deferred activation");
        if !self.presentation.show_tool_window(workspace) {
            warn!(workspace = %workspace, "trainer tool window unavailable");
            return ActivationResult::Skipped(continuation);
        }
        match continuation {
            Continuation::OpenLesson(lesson) => {
                self.presentation.show_lesson_view();
                let result = self.open_lesson(Some(workspace), &lesson);
                ActivationResult::Lesson { lesson, result }
            }
            Continuation::ShowModules => {
                self.presentation.show_modules_view(workspace);
                ActivationResult::Modules(workspace.clone())
            }
        }
    }

    /// Entry point without a concrete lesson: make sure the tutorial
    /// workspace exists and show the module list in it.
    /// 未指定課程時的入口：確保教學工作區存在並顯示模組列表。
    pub fn show_modules(
        &mut self,
        current: Option<&WorkspaceId>,
    ) -> Result<ModulesOutcome, OpenError> {
        let initialized = self
            .initialize(current, Continuation::ShowModules)
            .map_err(|err| {
                error!(error = %err, "unable to show trainer modules");
                err
            })?;
        Ok(match initialized {
            Initialized::Declined => ModulesOutcome::Aborted,
            Initialized::Ready(workspace) => {
                if self.presentation.show_tool_window(&workspace.id) {
                    self.presentation.show_modules_view(&workspace.id);
                }
                ModulesOutcome::Shown(workspace.id)
            }
            Initialized::Scheduled { workspace, handle } => {
                ModulesOutcome::Deferred { workspace, handle }
            }
        })
    }

    /// Closes an open lesson. When it passed and a listener asked for the
    /// next lesson, that lesson is opened in the workspace the listener was
    /// bound to, falling back to `workspace`.
    pub fn complete_lesson(
        &mut self,
        workspace: Option<&WorkspaceId>,
        lesson: &LessonId,
        passed: bool,
    ) -> Result<Option<OpenOutcome>, OpenError> {
        let is_open = self
            .course
            .lesson(lesson)
            .map(Lesson::is_open)
            .ok_or_else(|| OpenError::UnknownLesson(lesson.clone()))?;
        if !is_open {
            debug!(lesson = %lesson, "completion for a lesson that is not open ignored");
            return Ok(None);
        }
        if !passed {
            self.course.abort_lesson(lesson)?;
            info!(lesson = %lesson, "lesson aborted");
            return Ok(None);
        }

        let effects = self.course.pass_lesson(lesson)?;
        info!(lesson = %lesson, "lesson passed");
        let next = effects.into_iter().find_map(|effect| match effect {
            ListenerEffect::OpenNext {
                lesson,
                workspace: bound,
            } => Some((lesson, bound)),
            ListenerEffect::None => None,
        });
        match next {
            Some((next, bound)) => {
                let target = bound.as_ref().or(workspace);
                debug!(lesson = %next, workspace = ?target, "opening next lesson");
                self.open_lesson(target, &next).map(Some)
            }
            None => Ok(None),
        }
    }
}

impl<H: Host + fmt::Debug> fmt::Debug for Orchestrator<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("host", &self.host)
            .field("registry", &self.registry)
            .field("activations", &self.activations)
            .finish_non_exhaustive()
    }
}

fn unavailable(id: &WorkspaceId) -> OpenError {
    OpenError::WorkspaceUnavailable(format!(
        "tutorial workspace {id} is neither open nor disposed"
    ))
}
