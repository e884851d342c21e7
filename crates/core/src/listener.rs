use std::collections::BTreeMap;
use std::fmt;

use crate::lesson::LessonId;
use crate::module::ModuleId;
use crate::workspace::WorkspaceId;

/// Kinds of observers a lesson may carry; at most one of each.
/// 課程監聽器的種類，每種最多一個。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    /// Opens the next lesson once the current one passes.
    Progression,
    /// Records completion metrics.
    Statistics,
}

/// Lifecycle notification delivered to listeners.
#[derive(Clone, Copy, Debug)]
pub struct LessonEvent<'a> {
    pub lesson: &'a LessonId,
    pub module: Option<&'a ModuleId>,
    /// Following lesson in course order, if any.
    pub next: Option<&'a LessonId>,
}

/// Follow-up requested by a listener after a lesson passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerEffect {
    None,
    /// Open `lesson`, in `workspace` when the listener is bound to one.
    OpenNext {
        lesson: LessonId,
        workspace: Option<WorkspaceId>,
    },
}

/// Observer attached to a single lesson.
/// 附掛在單一課程上的觀察者。
pub trait LessonListener: Send {
    fn kind(&self) -> ListenerKind;

    fn on_start(&mut self, _event: &LessonEvent<'_>) {}

    fn on_pass(&mut self, _event: &LessonEvent<'_>) -> ListenerEffect {
        ListenerEffect::None
    }

    fn on_abort(&mut self, _event: &LessonEvent<'_>) {}
}

/// Listener set keyed by [`ListenerKind`].
/// 以監聽器種類為鍵的集合。
#[derive(Default)]
pub struct ListenerSet {
    listeners: BTreeMap<ListenerKind, Box<dyn LessonListener>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: ListenerKind) -> bool {
        self.listeners.contains_key(&kind)
    }

    /// Builds and inserts a listener unless one of `kind` is already present.
    /// Returns whether the factory ran.
    /// 若同種監聽器尚未存在才建立並加入。
    pub fn attach_with<F>(&mut self, kind: ListenerKind, factory: F) -> bool
    where
        F: FnOnce() -> Box<dyn LessonListener>,
    {
        if self.contains(kind) {
            return false;
        }
        self.listeners.insert(kind, factory());
        true
    }

    pub fn remove(&mut self, kind: ListenerKind) -> bool {
        self.listeners.remove(&kind).is_some()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ListenerKind> + '_ {
        self.listeners.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn notify_start(&mut self, event: &LessonEvent<'_>) {
        for listener in self.listeners.values_mut() {
            listener.on_start(event);
        }
    }

    pub(crate) fn notify_pass(&mut self, event: &LessonEvent<'_>) -> Vec<ListenerEffect> {
        self.listeners
            .values_mut()
            .map(|listener| listener.on_pass(event))
            .filter(|effect| *effect != ListenerEffect::None)
            .collect()
    }

    pub(crate) fn notify_abort(&mut self, event: &LessonEvent<'_>) {
        for listener in self.listeners.values_mut() {
            listener.on_abort(event);
        }
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.listeners.keys()).finish()
    }
}
