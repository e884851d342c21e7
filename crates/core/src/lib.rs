//! Lesson, module and listener model for the feature trainer.
//! 功能教學（feature trainer）的課程、模組與監聽器模型。

pub mod course;
pub mod language;
pub mod lesson;
pub mod listener;
pub mod module;
pub mod workspace;

pub use course::{Course, CourseDescription, CourseError, LessonDescription, ModuleDescription};
pub use language::{LanguageId, PLAIN_TEXT};
pub use lesson::{Lesson, LessonId};
pub use listener::{LessonEvent, LessonListener, ListenerEffect, ListenerKind, ListenerSet};
pub use workspace::WorkspaceId;
pub use module::{lesson_file_name, Module, ModuleId, ModuleKind, FALLBACK_FILE_STEM};
