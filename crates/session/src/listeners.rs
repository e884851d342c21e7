//! Built-in lesson listeners and their idempotent attachment.
//! 內建課程監聽器與其冪等附掛。

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};
use trainer_core::{
    Lesson, LessonEvent, LessonId, LessonListener, ListenerEffect, ListenerKind,
};
use trainer_project::WorkspaceId;

/// Builds a listener bound to the resolved workspace.
pub type ListenerFactory = Box<dyn Fn(&WorkspaceId) -> Box<dyn LessonListener> + Send>;

/// Attaches a listener of `kind` unless the lesson already has one.
/// Returns whether a listener was added.
pub fn attach_listener(
    lesson: &mut Lesson,
    kind: ListenerKind,
    factory: &dyn Fn(&WorkspaceId) -> Box<dyn LessonListener>,
    workspace: &WorkspaceId,
) -> bool {
    let attached = lesson
        .listeners_mut()
        .attach_with(kind, || factory(workspace));
    if attached {
        debug!(lesson = %lesson.id(), ?kind, workspace = %workspace, "listener attached");
    }
    attached
}

/// Requests the next lesson once the current one passes.
#[derive(Debug)]
pub struct ProgressionListener {
    workspace: WorkspaceId,
}

impl ProgressionListener {
    pub fn new(workspace: WorkspaceId) -> Self {
        Self { workspace }
    }
}

impl LessonListener for ProgressionListener {
    fn kind(&self) -> ListenerKind {
        ListenerKind::Progression
    }

    fn on_pass(&mut self, event: &LessonEvent<'_>) -> ListenerEffect {
        match event.next {
            Some(next) => {
                debug!(lesson = %event.lesson, next = %next, workspace = %self.workspace, "queueing next lesson");
                ListenerEffect::OpenNext {
                    lesson: next.clone(),
                    workspace: Some(self.workspace.clone()),
                }
            }
            None => ListenerEffect::None,
        }
    }
}

/// One finished (or abandoned) lesson run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub lesson: LessonId,
    pub workspace: WorkspaceId,
    pub passed: bool,
    pub elapsed: Duration,
}

/// Shared sink the statistics listeners write into.
/// 統計監聽器共用的紀錄。
#[derive(Debug, Clone, Default)]
pub struct StatisticsLog {
    records: Arc<Mutex<Vec<CompletionRecord>>>,
}

impl StatisticsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: CompletionRecord) {
        self.records.lock().push(record);
    }

    pub fn records(&self) -> Vec<CompletionRecord> {
        self.records.lock().clone()
    }

    pub fn passed_count(&self) -> usize {
        self.records.lock().iter().filter(|r| r.passed).count()
    }
}

/// Records completion metrics for one lesson.
#[derive(Debug)]
pub struct StatisticsListener {
    workspace: WorkspaceId,
    log: StatisticsLog,
    started: Option<Instant>,
}

impl StatisticsListener {
    pub fn new(workspace: WorkspaceId, log: StatisticsLog) -> Self {
        Self {
            workspace,
            log,
            started: None,
        }
    }

    fn finish(&mut self, lesson: &LessonId, passed: bool) {
        let elapsed = self
            .started
            .take()
            .map(|start| start.elapsed())
            .unwrap_or_default();
        info!(lesson = %lesson, passed, elapsed_ms = elapsed.as_millis() as u64, "lesson finished");
        self.log.record(CompletionRecord {
            lesson: lesson.clone(),
            workspace: self.workspace.clone(),
            passed,
            elapsed,
        });
    }
}

impl LessonListener for StatisticsListener {
    fn kind(&self) -> ListenerKind {
        ListenerKind::Statistics
    }

    fn on_start(&mut self, _event: &LessonEvent<'_>) {
        self.started = Some(Instant::now());
    }

    fn on_pass(&mut self, event: &LessonEvent<'_>) -> ListenerEffect {
        self.finish(event.lesson, true);
        ListenerEffect::None
    }

    fn on_abort(&mut self, event: &LessonEvent<'_>) {
        self.finish(event.lesson, false);
    }
}

/// Factories for the two listener kinds attached on every open.
pub struct ListenerFactories {
    pub progression: ListenerFactory,
    pub statistics: ListenerFactory,
}

impl ListenerFactories {
    /// Built-in listeners; statistics go to `log`.
    pub fn builtin(log: StatisticsLog) -> Self {
        Self {
            progression: Box::new(|workspace: &WorkspaceId| -> Box<dyn LessonListener> {
                Box::new(ProgressionListener::new(workspace.clone()))
            }),
            statistics: Box::new(move |workspace: &WorkspaceId| -> Box<dyn LessonListener> {
                Box::new(StatisticsListener::new(workspace.clone(), log.clone()))
            }),
        }
    }

    /// Attaches both kinds against `workspace`.
    pub fn attach_all(&self, lesson: &mut Lesson, workspace: &WorkspaceId) {
        attach_listener(
            lesson,
            ListenerKind::Progression,
            &*self.progression,
            workspace,
        );
        attach_listener(
            lesson,
            ListenerKind::Statistics,
            &*self.statistics,
            workspace,
        );
    }
}
