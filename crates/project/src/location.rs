use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::write_atomic;
use crate::workspace::WorkspaceError;

const LOCATION_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocationFile {
    version: u32,
    #[serde(default, with = "crate::path_codec")]
    workspace_path: Option<PathBuf>,
}

/// Durable record of where the tutorial workspace lives, reused across
/// process restarts.  
/// 記錄教學工作區位置，跨程序重啟沿用。
#[derive(Debug, Clone)]
pub struct WorkspaceLocationStore {
    path: PathBuf,
}

impl WorkspaceLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the recorded path. A missing file means nothing was recorded.  
    /// 讀取已記錄的路徑；檔案不存在時回傳 `Ok(None)`。
    pub fn load(&self) -> Result<Option<PathBuf>, WorkspaceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(WorkspaceError::Io(err)),
        };
        let file: LocationFile =
            serde_json::from_str(&contents).map_err(|err| WorkspaceError::InvalidState {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;
        Ok(file.workspace_path)
    }

    /// Records (or clears) the workspace path with an atomic write.  
    /// 以原子寫入方式記錄或清除工作區路徑。
    pub fn save(&self, workspace_path: Option<&Path>) -> Result<(), WorkspaceError> {
        let file = LocationFile {
            version: LOCATION_FORMAT_VERSION,
            workspace_path: workspace_path.map(Path::to_path_buf),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|err| WorkspaceError::InvalidState {
            path: self.path.clone(),
            reason: err.to_string(),
        })?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }
}
