use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trainer_project::write_atomic;

const SETTINGS_VERSION: u32 = 1;
const MAX_RETRY_LIMIT: u32 = 10;

/// Failures reading or writing the trainer settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {path} is not valid trainer settings: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Options controlling how lessons are opened.
/// 控制課程開啟流程的設定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Name of the ephemeral document used by scratch lessons.
    #[serde(default = "default_scratch_file_name")]
    pub scratch_file_name: String,
    /// Overrides the language's default tutorial workspace name.
    #[serde(default)]
    pub workspace_name: Option<String>,
    /// How many times a toolchain selection may restart an open.
    #[serde(default = "default_max_toolchain_retries")]
    pub max_toolchain_retries: u32,
    /// Automated mode: workspaces are adopted or created without prompting.
    #[serde(default)]
    pub headless: bool,
    /// Where the tutorial workspace location is persisted.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_scratch_file_name() -> String {
    "Learning".to_string()
}

fn default_max_toolchain_retries() -> u32 {
    3
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            scratch_file_name: default_scratch_file_name(),
            workspace_name: None,
            max_toolchain_retries: default_max_toolchain_retries(),
            headless: false,
            state_file: None,
        }
    }
}

impl TrainerSettings {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = SETTINGS_VERSION;
        }
        if self.scratch_file_name.trim().is_empty() {
            self.scratch_file_name = default_scratch_file_name();
        }
        if self
            .workspace_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            self.workspace_name = None;
        }
        self.max_toolchain_retries = self.max_toolchain_retries.clamp(1, MAX_RETRY_LIMIT);
    }

    /// Workspace name to look for, given the language default.
    pub fn workspace_name_or<'a>(&'a self, language_default: &'a str) -> &'a str {
        self.workspace_name.as_deref().unwrap_or(language_default)
    }
}

/// Settings bound to the file they were read from.
/// 與來源檔案綁定的設定。
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    data: TrainerSettings,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>, settings: TrainerSettings) -> Self {
        Self {
            path: path.into(),
            data: settings,
        }
    }

    /// Reads and sanitizes `path`; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let mut data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<TrainerSettings>(&contents).map_err(
                |source| SettingsError::Format {
                    path: path.clone(),
                    source,
                },
            )?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => TrainerSettings::default(),
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn settings(&self) -> &TrainerSettings {
        &self.data
    }

    pub fn into_settings(self) -> TrainerSettings {
        self.data
    }

    /// Applies `op`, sanitizes and writes the result back.
    pub fn update<F>(&mut self, op: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut TrainerSettings),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let payload =
            serde_json::to_vec_pretty(&self.data).map_err(|source| SettingsError::Format {
                path: self.path.clone(),
                source,
            })?;
        write_atomic(&self.path, &payload).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
