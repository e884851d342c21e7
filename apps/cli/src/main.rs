use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;
use trainer_core::{Course, LessonId, ModuleKind};
use trainer_project::{Resource, ResourceLocation, WorkspaceId, WorkspaceLocationStore};
use trainer_session::{
    ActivationResult, HeadlessHost, LanguageProfile, OpenOutcome, Orchestrator, SessionRegistry,
    WorkspaceHost,
};
use trainer_settings::{SettingsStore, TrainerSettings};

const SETTINGS_FILE: &str = "trainer-settings.json";
const STATE_FILE: &str = ".trainer-state.json";

#[derive(Parser)]
#[command(
    name = "trainer-cli",
    about = "Open interactive lessons in a headless trainer session",
    author,
    version
)]
struct Cli {
    /// 提高日誌詳細程度（可重複）。 / Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// 設定檔路徑；預設為根目錄下的 trainer-settings.json。 / Settings file (defaults to trainer-settings.json under the root).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// 存放工作區的根目錄；預設為目前目錄。 / Directory holding the workspaces (defaults to current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 開啟課程並顯示綁定的文件。 / Open a lesson and print the bound document.
    Open(OpenArgs),
    /// 列出課程中的模組與課程。 / List the modules and lessons of a course.
    Modules(ModulesArgs),
    /// 檢視或修改設定。 / Inspect or change settings.
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args)]
struct OpenArgs {
    /// 課程描述檔（JSON）。 / Course description file (JSON).
    #[arg(long, value_name = "FILE")]
    course: PathBuf,
    /// 要開啟的課程名稱。 / Name of the lesson to open.
    #[arg(long, value_name = "NAME")]
    lesson: String,
    /// 呼叫端目前所在的工作區名稱。 / Name of the workspace the caller is in.
    #[arg(long, value_name = "NAME")]
    current: Option<String>,
}

#[derive(Args)]
struct ModulesArgs {
    /// 課程描述檔（JSON）。 / Course description file (JSON).
    #[arg(long, value_name = "FILE")]
    course: PathBuf,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// 以 JSON 輸出目前生效的設定。 / Print the effective settings as JSON.
    Show,
    /// 修改設定並寫回設定檔。 / Change settings and write them back.
    Set(SetArgs),
}

#[derive(Args)]
struct SetArgs {
    /// 暫存課程文件名稱。 / Name of the scratch lesson document.
    #[arg(long, value_name = "NAME")]
    scratch_name: Option<String>,
    /// 教學工作區名稱。 / Tutorial workspace name.
    #[arg(long, value_name = "NAME")]
    workspace_name: Option<String>,
    /// 工具鏈選擇的重試上限。 / Retry limit for toolchain selection.
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,
    /// 自動化模式（不提示）。 / Automated mode (no prompts).
    #[arg(long, value_name = "BOOL")]
    headless: Option<bool>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        verbose,
        config,
        root,
        command,
    } = Cli::parse();
    init_logging(verbose);

    let root = resolve_root(root)?;
    let store = load_settings(config.unwrap_or_else(|| root.join(SETTINGS_FILE)))?;
    match command {
        Commands::Open(args) => execute_open(args, &root, store.into_settings()),
        Commands::Modules(args) => execute_modules(args),
        Commands::Settings(SettingsCommand::Show) => {
            println!("{}", serde_json::to_string_pretty(store.settings())?);
            Ok(())
        }
        Commands::Settings(SettingsCommand::Set(args)) => execute_set(args, store),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
    trace!("CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(path) => path,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    std::fs::create_dir_all(&root)
        .with_context(|| format!("failed to create root directory {}", root.display()))?;
    Ok(root)
}

fn load_settings(path: PathBuf) -> Result<SettingsStore> {
    let store = SettingsStore::load(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    debug!(path = %path.display(), "settings loaded");
    Ok(store)
}

fn execute_set(args: SetArgs, mut store: SettingsStore) -> Result<()> {
    let SetArgs {
        scratch_name,
        workspace_name,
        max_retries,
        headless,
    } = args;
    store
        .update(|settings| {
            if let Some(name) = scratch_name {
                settings.scratch_file_name = name;
            }
            if let Some(name) = workspace_name {
                settings.workspace_name = Some(name);
            }
            if let Some(limit) = max_retries {
                settings.max_toolchain_retries = limit;
            }
            if let Some(headless) = headless {
                settings.headless = headless;
            }
        })
        .with_context(|| format!("failed to save settings to {}", store.path().display()))?;
    println!("Settings saved to {}", store.path().display());
    Ok(())
}

fn execute_open(args: OpenArgs, root: &Path, settings: TrainerSettings) -> Result<()> {
    let course = Course::load(&args.course)
        .with_context(|| format!("failed to load course {}", args.course.display()))?;
    let state_file = settings
        .state_file
        .clone()
        .unwrap_or_else(|| root.join(STATE_FILE));
    let registry = SessionRegistry::with_store(WorkspaceLocationStore::new(&state_file))
        .with_context(|| format!("failed to read session state {}", state_file.display()))?;

    let mut host = HeadlessHost::new(root);
    let current = match &args.current {
        Some(name) => Some(
            host.open_caller_workspace(name)
                .with_context(|| format!("failed to open workspace '{name}'"))?,
        ),
        None => None,
    };

    let mut orchestrator =
        Orchestrator::new(host, course, LanguageProfile::plain_text(), settings)
            .with_registry(registry);
    let lesson = LessonId::new(args.lesson.as_str());
    let outcome = orchestrator
        .open_lesson(current.as_ref(), &lesson)
        .with_context(|| format!("failed to open lesson '{lesson}'"))?;

    let outcome = match outcome {
        OpenOutcome::Deferred { workspace, .. } => {
            finish_deferred(&mut orchestrator, &workspace, &lesson)?
        }
        other => other,
    };

    match outcome {
        OpenOutcome::Started(bound) => {
            let workspace = orchestrator
                .host()
                .workspace(&bound.workspace)
                .map(|ws| ws.name)
                .unwrap_or_else(|| bound.workspace.to_string());
            println!("Opened lesson '{}'", bound.lesson);
            println!("  workspace: {workspace}");
            println!("  resource:  {}", describe_resource(&bound.resource));
            Ok(())
        }
        OpenOutcome::Aborted => {
            println!("Lesson '{lesson}' was not opened.");
            Ok(())
        }
        OpenOutcome::Deferred { workspace, .. } => {
            bail!("workspace {workspace} did not finish starting")
        }
    }
}

/// Completes startup of a freshly created tutorial workspace and collects
/// the resumed open.
/// 完成新工作區的啟動並取得延後的開啟結果。
fn finish_deferred(
    orchestrator: &mut Orchestrator<HeadlessHost>,
    workspace: &WorkspaceId,
    lesson: &LessonId,
) -> Result<OpenOutcome> {
    if !orchestrator.host_mut().finish_startup(workspace) {
        bail!("workspace {workspace} is not open");
    }
    for activation in orchestrator.workspace_ready(workspace) {
        if let ActivationResult::Lesson {
            lesson: opened,
            result,
        } = activation
        {
            if &opened == lesson {
                return result.with_context(|| format!("failed to open lesson '{lesson}'"));
            }
        }
    }
    Err(anyhow!("lesson '{lesson}' was not resumed after startup"))
}

fn describe_resource(resource: &Resource) -> String {
    match resource.location() {
        ResourceLocation::Scratch { name } => format!("scratch:{name} [{}]", resource.language()),
        ResourceLocation::File { path } => path.display().to_string(),
    }
}

fn execute_modules(args: ModulesArgs) -> Result<()> {
    let course = Course::load(&args.course)
        .with_context(|| format!("failed to load course {}", args.course.display()))?;
    if course.modules().is_empty() {
        println!("No modules.");
        return Ok(());
    }
    for module in course.modules() {
        let kind = match module.kind() {
            ModuleKind::Regular => "regular",
            ModuleKind::Scratch => "scratch",
        };
        println!("{} ({kind})", module.name());
        for lesson in course.lessons_in(module.id()) {
            println!("  - {} [{}]", lesson.name(), lesson.language());
        }
    }
    Ok(())
}
