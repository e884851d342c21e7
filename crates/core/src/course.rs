use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::language::LanguageId;
use crate::lesson::{Lesson, LessonId};
use crate::listener::ListenerEffect;
use crate::module::{Module, ModuleId, ModuleKind};

/// Errors raised while building or querying a course.
/// 建立或查詢課程時的錯誤。
#[derive(Debug, Error)]
pub enum CourseError {
    #[error("failed to read course {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid course description: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("duplicate {what} '{name}' in course")]
    Duplicate { what: &'static str, name: String },
    #[error("lesson '{0}' not found")]
    UnknownLesson(LessonId),
    #[error("module '{0}' not found")]
    UnknownModule(ModuleId),
}

/// Serialized course layout.
/// 課程描述檔的序列化格式。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourseDescription {
    /// Language used by lessons that do not name one.
    #[serde(default)]
    pub lang: LanguageId,
    #[serde(default)]
    pub modules: Vec<ModuleDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDescription {
    pub name: String,
    #[serde(default)]
    pub kind: ModuleKind,
    #[serde(default)]
    pub lessons: Vec<LessonDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDescription {
    pub name: String,
    #[serde(default)]
    pub lang: Option<LanguageId>,
}

/// In-memory lesson registry: modules and lessons in course order.
///
/// At most one lesson is open at a time; starting a lesson aborts any other
/// open one.
/// 記憶體中的課程登錄表，依課程順序保存模組與課程。
#[derive(Debug, Default)]
pub struct Course {
    modules: Vec<Module>,
    lessons: Vec<Lesson>,
    index: HashMap<LessonId, usize>,
}

impl Course {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a course from a JSON description file.
    /// 從 JSON 描述檔載入課程。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CourseError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CourseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(text: &str) -> Result<Self, CourseError> {
        let description: CourseDescription = serde_json::from_str(text)?;
        Self::from_description(description)
    }

    pub fn from_description(description: CourseDescription) -> Result<Self, CourseError> {
        let mut course = Self::new();
        for module in description.modules {
            let module_id = ModuleId::new(module.name.clone());
            course.add_module(Module::new(module.name, module.kind))?;
            for lesson in module.lessons {
                let lang = lesson.lang.unwrap_or_else(|| description.lang.clone());
                course.add_lesson(Lesson::new(lesson.name, Some(module_id.clone()), lang))?;
            }
        }
        debug!(
            modules = course.modules.len(),
            lessons = course.lessons.len(),
            "course loaded"
        );
        Ok(course)
    }

    pub fn add_module(&mut self, module: Module) -> Result<(), CourseError> {
        if self.module(module.id()).is_some() {
            return Err(CourseError::Duplicate {
                what: "module",
                name: module.name().to_string(),
            });
        }
        self.modules.push(module);
        Ok(())
    }

    /// Registers a lesson. Lessons without a module are accepted; opening
    /// them is rejected later.
    pub fn add_lesson(&mut self, lesson: Lesson) -> Result<(), CourseError> {
        if self.index.contains_key(lesson.id()) {
            return Err(CourseError::Duplicate {
                what: "lesson",
                name: lesson.name().to_string(),
            });
        }
        if let Some(module) = lesson.module() {
            if self.module(module).is_none() {
                return Err(CourseError::UnknownModule(module.clone()));
            }
        }
        self.index.insert(lesson.id().clone(), self.lessons.len());
        self.lessons.push(lesson);
        Ok(())
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|module| module.id() == id)
    }

    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter()
    }

    pub fn lessons_in<'a>(&'a self, module: &'a ModuleId) -> impl Iterator<Item = &'a Lesson> {
        self.lessons
            .iter()
            .filter(move |lesson| lesson.module() == Some(module))
    }

    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.index.get(id).map(|&idx| &self.lessons[idx])
    }

    pub fn lesson_mut(&mut self, id: &LessonId) -> Option<&mut Lesson> {
        match self.index.get(id) {
            Some(&idx) => Some(&mut self.lessons[idx]),
            None => None,
        }
    }

    /// Module owning the lesson, if both exist.
    pub fn module_of(&self, id: &LessonId) -> Option<&Module> {
        self.lesson(id)
            .and_then(Lesson::module)
            .and_then(|module| self.module(module))
    }

    /// Lesson following `id` in course order, crossing module boundaries.
    /// 依課程順序取得下一堂課。
    pub fn next_lesson(&self, id: &LessonId) -> Option<&LessonId> {
        let idx = *self.index.get(id)?;
        self.lessons.get(idx + 1).map(Lesson::id)
    }

    /// Lesson currently open, if any.
    pub fn open_lesson(&self) -> Option<&LessonId> {
        self.lessons
            .iter()
            .find(|lesson| lesson.is_open())
            .map(Lesson::id)
    }

    /// Opens `id`, aborting whichever other lesson was open.
    pub fn start_lesson(&mut self, id: &LessonId) -> Result<(), CourseError> {
        let idx = self.position(id)?;
        let others: Vec<LessonId> = self
            .lessons
            .iter()
            .filter(|lesson| lesson.is_open() && lesson.id() != id)
            .map(|lesson| lesson.id().clone())
            .collect();
        for other in others {
            self.abort_lesson(&other)?;
        }
        let next = self.lessons.get(idx + 1).map(|lesson| lesson.id().clone());
        self.lessons[idx].start(next.as_ref());
        Ok(())
    }

    pub fn pass_lesson(&mut self, id: &LessonId) -> Result<Vec<ListenerEffect>, CourseError> {
        let idx = self.position(id)?;
        let next = self.lessons.get(idx + 1).map(|lesson| lesson.id().clone());
        Ok(self.lessons[idx].pass(next.as_ref()))
    }

    pub fn abort_lesson(&mut self, id: &LessonId) -> Result<(), CourseError> {
        let idx = self.position(id)?;
        let next = self.lessons.get(idx + 1).map(|lesson| lesson.id().clone());
        self.lessons[idx].abort(next.as_ref());
        Ok(())
    }

    fn position(&self, id: &LessonId) -> Result<usize, CourseError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| CourseError::UnknownLesson(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "lang": "java",
        "modules": [
            {"name": "Editor Basics", "lessons": [{"name": "Select"}, {"name": "Move", "lang": "kotlin"}]},
            {"name": "Playground", "kind": "scratch", "lessons": [{"name": "Scratch One"}]}
        ]
    }"#;

    #[test]
    fn description_populates_modules_and_lessons_in_order() {
        let course = Course::from_json(SAMPLE).unwrap();
        assert_eq!(course.modules().len(), 2);
        assert_eq!(course.modules()[1].kind(), ModuleKind::Scratch);

        let select = course.lesson(&LessonId::new("Select")).unwrap();
        assert_eq!(select.language().as_str(), "java");
        let moved = course.lesson(&LessonId::new("Move")).unwrap();
        assert_eq!(moved.language().as_str(), "kotlin");

        let next = course.next_lesson(&LessonId::new("Move")).unwrap();
        assert_eq!(next.as_str(), "Scratch One");
        assert!(course.next_lesson(&LessonId::new("Scratch One")).is_none());
    }

    #[test]
    fn duplicate_lessons_are_rejected() {
        let mut course = Course::from_json(SAMPLE).unwrap();
        let err = course
            .add_lesson(Lesson::new("Select", None, LanguageId::plain_text()))
            .unwrap_err();
        assert!(matches!(err, CourseError::Duplicate { what: "lesson", .. }));
    }

    #[test]
    fn lessons_must_reference_known_modules() {
        let mut course = Course::new();
        let err = course
            .add_lesson(Lesson::new(
                "Lost",
                Some(ModuleId::new("Nowhere")),
                LanguageId::plain_text(),
            ))
            .unwrap_err();
        assert!(matches!(err, CourseError::UnknownModule(_)));
    }

    #[test]
    fn starting_a_lesson_closes_the_previous_one() {
        let mut course = Course::from_json(SAMPLE).unwrap();
        let select = LessonId::new("Select");
        let moved = LessonId::new("Move");
        course.start_lesson(&select).unwrap();
        course.start_lesson(&moved).unwrap();
        assert!(!course.lesson(&select).unwrap().is_open());
        assert_eq!(course.open_lesson(), Some(&moved));
    }
}
