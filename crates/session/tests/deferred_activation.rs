use std::error::Error;
use std::sync::{Arc, Mutex};
use std::thread;

use tempfile::{tempdir, TempDir};
use trainer_core::{Course, LessonId};
use trainer_project::{WorkspaceId, WorkspaceLocationStore};
use trainer_session::{
    ActivationResult, HeadlessHost, LanguageProfile, LessonLauncher, ModulesOutcome, OpenError,
    OpenOutcome, Orchestrator, Presentation, PromptRecord, SessionRegistry, WorkspaceHost,
};
use trainer_settings::TrainerSettings;

const COURSE: &str = r#"{
    "lang": "plaintext",
    "modules": [
        {"name": "M1", "lessons": [{"name": "L1"}, {"name": "L3"}]},
        {"name": "M2", "kind": "scratch", "lessons": [{"name": "L2"}]}
    ]
}"#;

type TestResult = Result<(), Box<dyn Error>>;

#[derive(Clone, Default)]
struct RecordingPresentation {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingPresentation {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Presentation for RecordingPresentation {
    fn show_tool_window(&mut self, workspace: &WorkspaceId) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push(format!("tool window {workspace}"));
        true
    }

    fn show_lesson_view(&mut self) {
        self.calls.lock().unwrap().push("lesson view".into());
    }

    fn show_modules_view(&mut self, _workspace: &WorkspaceId) {
        self.calls.lock().unwrap().push("modules view".into());
    }
}

fn orchestrator(
    tmp: &TempDir,
    settings: TrainerSettings,
) -> Result<Orchestrator<HeadlessHost>, Box<dyn Error>> {
    Ok(Orchestrator::new(
        HeadlessHost::new(tmp.path()),
        Course::from_json(COURSE)?,
        LanguageProfile::plain_text(),
        settings,
    ))
}

fn lesson(name: &str) -> LessonId {
    LessonId::new(name)
}

fn started(result: &ActivationResult) -> &trainer_session::BoundLesson {
    match result {
        ActivationResult::Lesson {
            result: Ok(OpenOutcome::Started(bound)),
            ..
        } => bound,
        other => panic!("expected a started lesson, got {other:?}"),
    }
}

#[test]
fn fresh_workspace_defers_the_open_until_startup_completes() -> TestResult {
    let tmp = tempdir()?;
    let presentation = RecordingPresentation::default();
    let mut orch =
        orchestrator(&tmp, TrainerSettings::default())?.with_presentation(presentation.clone());
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;

    let outcome = orch.open_lesson(Some(&caller), &lesson("L1"))?;
    let OpenOutcome::Deferred { workspace, handle } = outcome.clone() else {
        panic!("expected a deferred open, got {outcome:?}");
    };

    assert_eq!(
        orch.host().prompts(),
        &[PromptRecord::NewWorkspace(Some(caller.clone()))]
    );
    assert!(orch.activations().is_pending(handle));
    assert!(orch.host().editors().is_empty());
    assert!(!orch.course().lesson(&lesson("L1")).unwrap().is_open());
    assert_eq!(orch.registry().workspace(), Some(&workspace));

    assert!(orch.host_mut().finish_startup(&workspace));
    let results = orch.workspace_ready(&workspace);
    assert_eq!(results.len(), 1);
    let bound = started(&results[0]);

    assert_eq!(bound.lesson, lesson("L1"));
    assert_eq!(bound.workspace, workspace);
    assert_eq!(bound.resource.name(), "M1.txt");
    assert!(tmp.path().join("LearnProject").join("src").join("M1.txt").is_file());
    assert!(orch.course().lesson(&lesson("L1")).unwrap().is_open());
    assert!(orch.activations().is_empty());
    assert_eq!(
        presentation.calls()[..2],
        [format!("tool window {workspace}"), "lesson view".to_string()]
    );

    assert!(orch.workspace_ready(&workspace).is_empty());
    Ok(())
}

#[test]
fn declining_the_new_workspace_changes_nothing() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, TrainerSettings::default())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    orch.host_mut().answer_workspace_prompt(false);

    let outcome = orch.open_lesson(Some(&caller), &lesson("L1"))?;

    assert_eq!(outcome, OpenOutcome::Aborted);
    assert!(orch.registry().workspace().is_none());
    assert!(orch.registry().workspace_path().is_none());
    assert!(orch.activations().is_empty());
    assert_eq!(orch.host().workspaces_created(), 0);
    Ok(())
}

fn establish(
    orch: &mut Orchestrator<HeadlessHost>,
    caller: &WorkspaceId,
) -> Result<WorkspaceId, Box<dyn Error>> {
    let OpenOutcome::Deferred { workspace, .. } = orch.open_lesson(Some(caller), &lesson("L1"))?
    else {
        return Err("expected a deferred open".into());
    };
    orch.host_mut().finish_startup(&workspace);
    let results = orch.workspace_ready(&workspace);
    started(&results[0]);
    Ok(workspace)
}

#[test]
fn disposed_workspace_is_reinitialized_from_recorded_path() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, TrainerSettings::default())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    let learn = establish(&mut orch, &caller)?;

    orch.host_mut().dispose_workspace(&learn);
    let outcome = orch.open_lesson(Some(&caller), &lesson("L3"))?;

    let OpenOutcome::Deferred { workspace, .. } = outcome.clone() else {
        panic!("disposed workspace must be reinitialized, got {outcome:?}");
    };
    assert_eq!(workspace, learn, "reloaded from the recorded path");
    assert_eq!(orch.host().workspaces_loaded(), 1);
    assert_eq!(orch.host().workspaces_created(), 1);
    assert_eq!(
        orch.host()
            .prompts()
            .iter()
            .filter(|p| matches!(p, PromptRecord::NewWorkspace(_)))
            .count(),
        2
    );

    orch.host_mut().finish_startup(&workspace);
    let results = orch.workspace_ready(&workspace);
    assert_eq!(started(&results[0]).resource.name(), "M1.txt");
    assert!(orch.course().lesson(&lesson("L3")).unwrap().is_open());
    Ok(())
}

#[test]
fn open_but_unfocused_workspace_is_used_directly() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, TrainerSettings::default())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    let learn = establish(&mut orch, &caller)?;
    orch.host_mut().focus_workspace(&caller)?;
    let prompts = orch.host().prompts().len();

    let outcome = orch.open_lesson(Some(&caller), &lesson("L3"))?;

    assert_eq!(outcome.bound().unwrap().workspace, learn);
    assert_eq!(orch.host().focused_workspace(), Some(learn));
    assert_eq!(orch.host().prompts().len(), prompts);
    Ok(())
}

#[test]
fn closed_but_live_workspace_is_unavailable() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, TrainerSettings::default())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    let learn = establish(&mut orch, &caller)?;
    orch.host_mut().close_workspace(&learn);

    let err = orch
        .open_lesson(Some(&caller), &lesson("L3"))
        .unwrap_err();
    assert!(matches!(err, OpenError::WorkspaceUnavailable(_)));
    Ok(())
}

#[test]
fn failed_startup_drops_pending_opens() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, TrainerSettings::default())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;

    let OpenOutcome::Deferred { workspace, handle } =
        orch.open_lesson(Some(&caller), &lesson("L1"))?
    else {
        panic!("expected a deferred open");
    };
    assert_eq!(orch.workspace_failed(&workspace), 1);
    assert!(!orch.activations().is_pending(handle));

    orch.host_mut().finish_startup(&workspace);
    assert!(orch.workspace_ready(&workspace).is_empty());
    assert!(!orch.course().lesson(&lesson("L1")).unwrap().is_open());
    Ok(())
}

#[test]
fn show_modules_waits_for_startup() -> TestResult {
    let tmp = tempdir()?;
    let presentation = RecordingPresentation::default();
    let mut orch =
        orchestrator(&tmp, TrainerSettings::default())?.with_presentation(presentation.clone());

    let outcome = orch.show_modules(None)?;
    let ModulesOutcome::Deferred { workspace, .. } = outcome.clone() else {
        panic!("expected deferred module list, got {outcome:?}");
    };
    assert!(orch.host().prompts().is_empty(), "no caller, no prompt");
    assert!(presentation.calls().is_empty());

    orch.host_mut().finish_startup(&workspace);
    let results = orch.workspace_ready(&workspace);
    assert!(matches!(&results[..], [ActivationResult::Modules(ws)] if *ws == workspace));
    assert_eq!(presentation.calls().last().map(String::as_str), Some("modules view"));
    Ok(())
}

#[test]
fn headless_mode_adopts_open_tutorial_workspace() -> TestResult {
    let tmp = tempdir()?;
    let settings = TrainerSettings {
        headless: true,
        ..TrainerSettings::default()
    };
    let mut orch = orchestrator(&tmp, settings)?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;

    let outcome = orch.show_modules(Some(&learn))?;

    assert_eq!(outcome, ModulesOutcome::Shown(learn.clone()));
    assert_eq!(orch.registry().workspace(), Some(&learn));
    assert!(orch.host().prompts().is_empty());
    Ok(())
}

#[test]
fn passing_a_lesson_opens_the_next_one() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, TrainerSettings::default())?;
    let learn = orch.host_mut().open_caller_workspace("LearnProject")?;
    orch.open_lesson(Some(&learn), &lesson("L1"))?;

    let next = orch.complete_lesson(Some(&learn), &lesson("L1"), true)?;

    let bound = next.as_ref().and_then(OpenOutcome::bound).unwrap();
    assert_eq!(bound.lesson, lesson("L3"));
    assert!(orch.course().lesson(&lesson("L1")).unwrap().is_passed());
    let records = orch.statistics().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].lesson, lesson("L1"));
    assert_eq!(records[0].workspace, learn);
    assert!(records[0].passed);

    let aborted = orch.complete_lesson(Some(&learn), &lesson("L3"), false)?;
    assert!(aborted.is_none());
    assert_eq!(orch.statistics().records().len(), 2);
    assert_eq!(orch.statistics().passed_count(), 1);
    Ok(())
}

#[test]
fn tutorial_workspace_location_survives_restart() -> TestResult {
    let tmp = tempdir()?;
    let state = tmp.path().join("trainer-state.json");
    let settings = TrainerSettings {
        state_file: Some(state.clone()),
        ..TrainerSettings::default()
    };

    let first_file = {
        let registry = SessionRegistry::with_store(WorkspaceLocationStore::new(&state))?;
        let mut orch = orchestrator(&tmp, settings.clone())?.with_registry(registry);
        let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
        establish(&mut orch, &caller)?;
        orch.registry()
            .resource(&trainer_core::ModuleId::new("M1"))
            .and_then(|r| r.path().map(|p| p.to_path_buf()))
            .unwrap()
    };

    let registry = SessionRegistry::with_store(WorkspaceLocationStore::new(&state))?;
    assert_eq!(
        registry.workspace_path(),
        Some(tmp.path().join("LearnProject").as_path())
    );
    let mut orch = orchestrator(&tmp, settings)?.with_registry(registry);
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    let learn = establish(&mut orch, &caller)?;

    assert_eq!(orch.host().workspaces_created(), 0);
    assert_eq!(orch.host().workspaces_loaded(), 2);
    let second_file = orch
        .registry()
        .resource(&trainer_core::ModuleId::new("M1"))
        .and_then(|r| r.path().map(|p| p.to_path_buf()))
        .unwrap();
    assert_eq!(first_file, second_file);
    assert_eq!(orch.registry().workspace(), Some(&learn));
    Ok(())
}

#[test]
fn concurrent_opens_are_serialized() -> TestResult {
    let tmp = tempdir()?;
    let mut orch = orchestrator(&tmp, TrainerSettings::default())?;
    let caller = orch.host_mut().open_caller_workspace("Scratchpad")?;
    let launcher = LessonLauncher::new(orch);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let launcher = launcher.clone();
            let caller = caller.clone();
            thread::spawn(move || launcher.open_lesson(Some(&caller), &lesson("L2")))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("open thread panicked"))
        .collect();

    let started = results
        .iter()
        .filter(|r| matches!(r, Ok(OpenOutcome::Started(_))))
        .count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(OpenError::LessonAlreadyOpen(_))))
        .count();
    assert_eq!((started, rejected), (1, 3));
    launcher.with(|orch| {
        assert_eq!(orch.host().editors().len(), 1);
        assert_eq!(orch.registry().resources().count(), 1);
    });
    Ok(())
}
