use std::fmt;

use serde::{Deserialize, Serialize};

use crate::language::LanguageId;
use crate::listener::{LessonEvent, ListenerEffect, ListenerSet};
use crate::module::ModuleId;

/// Stable identifier for a lesson (its name).
/// 課程的穩定識別碼。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

impl LessonId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single interactive lesson.
///
/// The `open` flag is set when the lesson is handed to the execution engine
/// and cleared again on pass or abort. Listeners are keyed by kind.
/// 單一互動課程；`open` 旗標於交付執行引擎時設為真，完成或中止時清除。
#[derive(Debug)]
pub struct Lesson {
    id: LessonId,
    module: Option<ModuleId>,
    language: LanguageId,
    open: bool,
    passed: bool,
    listeners: ListenerSet,
}

impl Lesson {
    pub fn new(name: impl Into<String>, module: Option<ModuleId>, language: LanguageId) -> Self {
        Self {
            id: LessonId::new(name),
            module,
            language,
            open: false,
            passed: false,
            listeners: ListenerSet::new(),
        }
    }

    pub fn id(&self) -> &LessonId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    pub fn module(&self) -> Option<&ModuleId> {
        self.module.as_ref()
    }

    pub fn language(&self) -> &LanguageId {
        &self.language
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerSet {
        &mut self.listeners
    }

    /// Marks the lesson open and notifies listeners.
    /// 將課程標記為開啟並通知監聽器。
    pub fn start(&mut self, next: Option<&LessonId>) {
        self.open = true;
        let event = LessonEvent {
            lesson: &self.id,
            module: self.module.as_ref(),
            next,
        };
        self.listeners.notify_start(&event);
    }

    /// Closes the lesson as passed, returning the listeners' follow-ups.
    /// 以通過狀態關閉課程，並回傳監聽器要求的後續動作。
    pub fn pass(&mut self, next: Option<&LessonId>) -> Vec<ListenerEffect> {
        self.open = false;
        self.passed = true;
        let event = LessonEvent {
            lesson: &self.id,
            module: self.module.as_ref(),
            next,
        };
        self.listeners.notify_pass(&event)
    }

    /// Closes the lesson without marking it passed. No-op when not open.
    pub fn abort(&mut self, next: Option<&LessonId>) {
        if !self.open {
            return;
        }
        self.open = false;
        let event = LessonEvent {
            lesson: &self.id,
            module: self.module.as_ref(),
            next,
        };
        self.listeners.notify_abort(&event);
    }
}
