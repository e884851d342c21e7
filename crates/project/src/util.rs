use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Writes data atomically by using a temporary sibling file followed by rename.  
/// 以臨時檔案搭配 rename 實現原子寫入。
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}

/// Creates an empty file named `name` directly under `root`.
///
/// Either the file exists afterwards or an error is returned and nothing was
/// created; an existing entry yields `AlreadyExists`.  
/// 在 `root` 下建立空白檔案；失敗時不留下任何檔案。
pub fn create_file_atomic(root: &Path, name: &str) -> io::Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid file name '{name}'"),
        ));
    }
    let target = root.join(name);
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)?;
    Ok(target)
}

/// Looks for `name` among content roots: a root whose own name matches, or a
/// direct child of a root. First hit wins.  
/// 在內容根目錄中尋找：根目錄本身同名，或其直接子項目。
pub fn find_in_content_roots(roots: &[PathBuf], name: &str) -> Option<PathBuf> {
    roots.iter().find_map(|root| {
        if root.file_name().is_some_and(|own| own == name) {
            return Some(root.clone());
        }
        let child = root.join(name);
        child.exists().then_some(child)
    })
}

pub(crate) fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
