//! Path encoding for persisted state: UTF-8 paths are stored verbatim,
//! anything else as `b64:` + base64 of the platform bytes.
//! 路徑序列化：UTF-8 直接保存，其餘以 base64 編碼。

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serializer};

const B64_PREFIX: &str = "b64:";

pub fn serialize<S>(value: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(path) => serializer.serialize_some(&encode(path)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| decode(&text).map_err(serde::de::Error::custom))
        .transpose()
}

pub(crate) fn encode(path: &Path) -> String {
    if let Some(text) = path.to_str() {
        if !text.starts_with(B64_PREFIX) {
            return text.to_string();
        }
    }
    format!("{B64_PREFIX}{}", BASE64.encode(raw_bytes(path)))
}

pub(crate) fn decode(text: &str) -> Result<PathBuf, String> {
    let Some(payload) = text.strip_prefix(B64_PREFIX) else {
        return Ok(PathBuf::from(text));
    };
    let bytes = BASE64
        .decode(payload.as_bytes())
        .map_err(|err| format!("invalid base64 path payload: {err}"))?;
    from_raw_bytes(bytes)
}

#[cfg(unix)]
fn raw_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(unix)]
fn from_raw_bytes(bytes: Vec<u8>) -> Result<PathBuf, String> {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(windows)]
fn raw_bytes(path: &Path) -> Vec<u8> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str()
        .encode_wide()
        .flat_map(u16::to_le_bytes)
        .collect()
}

#[cfg(windows)]
fn from_raw_bytes(bytes: Vec<u8>) -> Result<PathBuf, String> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    if bytes.len() % 2 != 0 {
        return Err("encoded Windows path has odd byte length".to_string());
    }
    let wide: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(PathBuf::from(OsString::from_wide(&wide)))
}
