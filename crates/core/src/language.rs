use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Language tag used for plain-text lessons.
pub const PLAIN_TEXT: &str = "plaintext";

/// Identifier for a lesson source language.
/// （課程原始碼語言的識別子。）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(Cow<'static, str>);

impl LanguageId {
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    pub fn plain_text() -> Self {
        Self(Cow::Borrowed(PLAIN_TEXT))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw tag.
    pub fn matches(&self, tag: &str) -> bool {
        self.0.eq_ignore_ascii_case(tag)
    }
}

impl Default for LanguageId {
    fn default() -> Self {
        Self::plain_text()
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for LanguageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for LanguageId {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for LanguageId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}
