use std::error::Error;
use std::fs;

use tempfile::{tempdir, TempDir};
use trainer_core::{Course, LanguageId, Lesson, LessonId, ModuleId};
use trainer_session::{
    DocumentHost, EditorHost, EditorMode, HeadlessHost, LanguageProfile, OpenError, OpenOutcome, Orchestrator,
    PromptRecord, Toolchain, WorkspaceHost,
};
use trainer_settings::TrainerSettings;

const COURSE: &str = r#"{
    "lang": "plaintext",
    "modules": [
        {"name": "M1", "lessons": [{"name": "L1"}, {"name": "L3"}]},
        {"name": "M2", "kind": "scratch", "lessons": [{"name": "L2"}]},
        {"name": "Java Playground", "kind": "scratch", "lessons": [{"name": "J1", "lang": "java"}]},
        {"name": "Legacy", "lessons": [{"name": "C1", "lang": "cobol"}]}
    ]
}"#;

type TestResult = Result<(), Box<dyn Error>>;

fn orchestrator(
    tmp: &TempDir,
    language: LanguageProfile,
) -> Result<Orchestrator<HeadlessHost>, Box<dyn Error>> {
    let host = HeadlessHost::new(tmp.path());
    let course = Course::from_json(COURSE)?;
    Ok(Orchestrator::new(
        host,
        course,
        language,
        TrainerSettings::default(),
    ))
}

fn lesson(name: &str) -> LessonId {
    LessonId::new(name)
}

#[test]
fn scratch_lesson_gets_learning_document_without_workspace_setup() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;

    let outcome = orch.open_lesson(Some(&caller), &lesson("L2"))?;
    let bound = outcome.bound().ok_or("scratch lesson should start")?;

    assert!(bound.resource.is_scratch());
    assert_eq!(bound.resource.name(), "Learning");
    assert_eq!(bound.resource.language().as_str(), "plaintext");
    assert_eq!(bound.workspace, caller);
    assert_eq!(
        orch.registry().resource(&ModuleId::new("M2")),
        Some(&bound.resource)
    );
    assert_eq!(
        orch.host().scratch_language("Learning"),
        Some(&LanguageId::plain_text())
    );

    assert!(orch.host().prompts().is_empty());
    assert_eq!(orch.host().workspaces_created(), 0);
    assert!(orch.registry().workspace().is_none());
    assert!(orch.course().lesson(&lesson("L2")).unwrap().is_open());
    Ok(())
}

#[test]
fn scratch_document_is_reused_and_retagged() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;

    let first = orch.open_lesson(Some(&caller), &lesson("L2"))?;
    orch.complete_lesson(Some(&caller), &lesson("L2"), false)?;
    let second = orch.open_lesson(Some(&caller), &lesson("L2"))?;

    let (first, second) = (first.bound().unwrap(), second.bound().unwrap());
    assert_eq!(first.resource, second.resource);
    assert_eq!(first.editor.id, second.editor.id);
    assert_eq!(orch.host().editors_opened(), 1);
    Ok(())
}

#[test]
fn invalid_scratch_document_is_recreated() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;

    orch.open_lesson(Some(&caller), &lesson("L2"))?;
    orch.complete_lesson(Some(&caller), &lesson("L2"), false)?;
    assert!(orch.host_mut().invalidate_scratch("Learning"));

    let outcome = orch.open_lesson(Some(&caller), &lesson("L2"))?;
    let bound = outcome.bound().unwrap();
    assert_eq!(bound.resource.name(), "Learning");
    assert!(orch.host().is_valid(&bound.resource));
    assert_eq!(orch.host().scratch_content("Learning"), Some(""));
    Ok(())
}

#[test]
fn open_lesson_is_rejected_without_side_effects() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    orch.open_lesson(Some(&caller), &lesson("L2"))?;

    let editors = orch.host().editors();
    let resources = orch.registry().resources().count();
    let err = orch
        .open_lesson(Some(&caller), &lesson("L2"))
        .unwrap_err();

    assert!(matches!(err, OpenError::LessonAlreadyOpen(ref id) if id.as_str() == "L2"));
    assert_eq!(orch.host().editors(), editors);
    assert_eq!(orch.registry().resources().count(), resources);
    assert!(orch.host().prompts().is_empty());
    Ok(())
}

#[test]
fn lesson_without_module_is_rejected() -> TestResult {
    let tmp = tempdir()?;
    let mut course = Course::new();
    course.add_lesson(Lesson::new("Orphan", None, LanguageId::plain_text()))?;
    let mut orch = Orchestrator::new(
        HeadlessHost::new(tmp.path()),
        course,
        LanguageProfile::plain_text(),
        TrainerSettings::default(),
    );
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;

    let err = orch
        .open_lesson(Some(&caller), &lesson("Orphan"))
        .unwrap_err();
    assert!(matches!(err, OpenError::MissingModule(_)));

    let err = orch
        .open_lesson(Some(&caller), &lesson("Nope"))
        .unwrap_err();
    assert!(matches!(err, OpenError::UnknownLesson(_)));
    Ok(())
}

#[test]
fn caller_already_in_tutorial_workspace_is_adopted() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;

    let outcome = orch.open_lesson(Some(&learn), &lesson("L1"))?;
    let bound = outcome.bound().ok_or("adopted workspace opens synchronously")?;

    assert_eq!(bound.workspace, learn);
    assert_eq!(bound.resource.name(), "M1.txt");
    assert!(tmp.path().join("LearnProject").join("src").join("M1.txt").is_file());
    assert_eq!(orch.registry().workspace(), Some(&learn));
    assert!(orch.host().prompts().is_empty());
    Ok(())
}

#[test]
fn repeated_opens_resolve_the_same_file_and_editor() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;

    let mut seen = Vec::new();
    for _ in 0..3 {
        let outcome = orch.open_lesson(Some(&learn), &lesson("L1"))?;
        seen.push(outcome.bound().cloned().unwrap());
        orch.complete_lesson(Some(&learn), &lesson("L1"), false)?;
    }

    assert!(seen.windows(2).all(|pair| pair[0].resource == pair[1].resource));
    assert!(seen.windows(2).all(|pair| pair[0].editor == pair[1].editor));
    assert_eq!(orch.host().editors_opened(), 1);
    Ok(())
}

#[test]
fn lessons_of_one_module_share_a_file() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;

    let first = orch.open_lesson(Some(&learn), &lesson("L1"))?;
    let second = orch.open_lesson(Some(&learn), &lesson("L3"))?;

    assert_eq!(first.bound().unwrap().resource, second.bound().unwrap().resource);
    assert!(!orch.course().lesson(&lesson("L1")).unwrap().is_open());
    assert!(orch.course().lesson(&lesson("L3")).unwrap().is_open());
    Ok(())
}

#[test]
fn failed_file_creation_registers_nothing() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;
    fs::remove_dir_all(tmp.path().join("LearnProject").join("src"))?;

    let err = orch
        .open_lesson(Some(&learn), &lesson("L1"))
        .unwrap_err();

    assert!(matches!(err, OpenError::ResourceCreation { ref name, .. } if name == "M1.txt"));
    assert!(orch.registry().resource(&ModuleId::new("M1")).is_none());
    assert!(orch.host().editors().is_empty());
    assert!(!orch.course().lesson(&lesson("L1")).unwrap().is_open());
    Ok(())
}

#[test]
fn unknown_language_extension_is_reported() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;

    let err = orch
        .open_lesson(Some(&learn), &lesson("C1"))
        .unwrap_err();
    assert!(matches!(err, OpenError::UnknownLanguage(ref lang) if lang.as_str() == "cobol"));
    assert_eq!(orch.registry().resources().count(), 0);
    Ok(())
}

#[test]
fn read_only_or_disposed_editors_fail_the_open() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;

    orch.host_mut().set_editor_mode(EditorMode::ViewerOnly);
    let err = orch
        .open_lesson(Some(&caller), &lesson("L2"))
        .unwrap_err();
    assert!(matches!(err, OpenError::EditorUnavailable(_)));

    orch.host_mut().set_editor_mode(EditorMode::DisposedOnOpen);
    let err = orch
        .open_lesson(Some(&caller), &lesson("L2"))
        .unwrap_err();
    assert!(matches!(err, OpenError::EditorUnavailable(_)));
    assert!(!orch.course().lesson(&lesson("L2")).unwrap().is_open());
    Ok(())
}

#[test]
fn existing_editor_is_reused_instead_of_opening_another() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;

    let first = orch.open_lesson(Some(&learn), &lesson("L1"))?;
    let resource = first.bound().unwrap().resource.clone();
    orch.complete_lesson(Some(&learn), &lesson("L1"), false)?;

    let existing = orch.host().editors_for(&learn, &resource);
    assert_eq!(existing.len(), 1);
    let again = orch.open_lesson(Some(&learn), &lesson("L1"))?;

    assert_eq!(again.bound().unwrap().editor, existing[0]);
    assert_eq!(orch.host().editors().len(), 1);
    assert_eq!(orch.host().focused_editor(), Some(existing[0].id));
    Ok(())
}

fn java() -> LanguageProfile {
    LanguageProfile::new(LanguageId::from("java"), "Java")
}

#[test]
fn missing_toolchain_prompts_and_retries() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, java())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    orch.host_mut()
        .offer_toolchain(Some(Toolchain::new("jdk-17", LanguageId::from("java"))));

    let outcome = orch.open_lesson(Some(&caller), &lesson("J1"))?;

    assert!(matches!(outcome, OpenOutcome::Started(_)));
    let toolchain_prompts: Vec<_> = orch
        .host()
        .prompts()
        .iter()
        .filter_map(|prompt| match prompt {
            PromptRecord::Toolchain { language, .. } => Some(language.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(toolchain_prompts, vec!["Java"]);
    assert_eq!(orch.host().toolchain(&caller).map(|t| t.name), Some("jdk-17".into()));
    Ok(())
}

#[test]
fn declined_toolchain_selection_aborts_silently() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, java())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    orch.host_mut().offer_toolchain(None);

    let outcome = orch.open_lesson(Some(&caller), &lesson("J1"))?;

    assert_eq!(outcome, OpenOutcome::Aborted);
    assert_eq!(orch.host().prompts().len(), 1);
    assert!(orch.host().editors().is_empty());
    assert!(orch.registry().resources().next().is_none());
    Ok(())
}

#[test]
fn toolchain_retries_are_bounded() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, java())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    let mut broken = Toolchain::new("jdk-broken", LanguageId::from("java"));
    broken.valid = false;
    orch.host_mut().offer_toolchain(Some(broken));

    let err = orch
        .open_lesson(Some(&caller), &lesson("J1"))
        .unwrap_err();

    assert!(matches!(err, OpenError::InvalidToolchain));
    let retries = orch.settings().max_toolchain_retries as usize;
    assert_eq!(orch.host().prompts().len(), retries);
    Ok(())
}

#[test]
fn toolchain_for_another_language_shows_module_problem() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, java())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    orch.host_mut().set_toolchain(
        &caller,
        Some(Toolchain::new("python3", LanguageId::from("python"))),
    );

    let err = orch
        .open_lesson(Some(&caller), &lesson("J1"))
        .unwrap_err();

    assert!(matches!(err, OpenError::ModuleKindUnsupported));
    assert_eq!(
        orch.host().prompts(),
        &[PromptRecord::ModuleProblem(Some(caller.clone()))]
    );
    Ok(())
}

#[test]
fn toolchain_selection_lands_where_the_scratch_check_looks() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, java())?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;
    orch.open_lesson(Some(&learn), &lesson("L1"))?;
    orch.host_mut()
        .offer_toolchain(Some(Toolchain::new("jdk-17", LanguageId::from("java"))));

    let outcome = orch.open_lesson(None, &lesson("J1"))?;

    let bound = outcome.bound().ok_or("scratch lesson should start after one selection")?;
    assert_eq!(bound.workspace, learn);
    assert_eq!(orch.host().prompts().len(), 1);
    assert_eq!(orch.host().toolchain(&learn).map(|t| t.name), Some("jdk-17".into()));
    Ok(())
}

#[test]
fn next_lesson_opens_in_the_workspace_the_listener_was_bound_to() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, LanguageProfile::plain_text())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    orch.open_lesson(Some(&caller), &lesson("L2"))?;

    let next = orch.complete_lesson(None, &lesson("L2"), true)?;

    let bound = next
        .as_ref()
        .and_then(OpenOutcome::bound)
        .ok_or("next lesson should start")?;
    assert_eq!(bound.lesson, lesson("J1"));
    assert_eq!(bound.workspace, caller);
    assert!(orch.registry().workspace().is_none());
    Ok(())
}
