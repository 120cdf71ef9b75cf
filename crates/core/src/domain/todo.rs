use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, COVER_EXTENSIONS, COVER_MAX_KB, TITLE_MAX_CHARS};

/// Server-assigned todo identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub u64);

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A todo record as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Absent on freshly created records, which are never finished
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub cover: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl std::fmt::Display for Todo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.is_finished { 'x' } else { ' ' };
        write!(f, "[{}] #{} {}", mark, self.id, self.title)
    }
}

/// Image attached to a create or update form
#[derive(Clone, PartialEq, Eq)]
pub struct CoverUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for CoverUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl CoverUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// MIME type matching the file extension
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            _ => "image/jpeg",
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let extension = self.extension();
        if !COVER_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ValidationError::CoverType { extension });
        }

        let size_kb = self.bytes.len().div_ceil(1024);
        if size_kb > COVER_MAX_KB {
            return Err(ValidationError::CoverTooLarge {
                size_kb,
                max_kb: COVER_MAX_KB,
            });
        }

        Ok(())
    }
}

fn validate_title(title: &str) -> std::result::Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleMissing);
    }

    let len = title.chars().count();
    if len > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong {
            len,
            max: TITLE_MAX_CHARS,
        });
    }

    Ok(())
}

/// Fields for creating a todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub cover: Option<CoverUpload>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            cover: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cover(mut self, cover: CoverUpload) -> Self {
        self.cover = Some(cover);
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_title(&self.title)?;
        if let Some(cover) = &self.cover {
            cover.validate()?;
        }
        Ok(())
    }
}

/// Change to an optional field in a [`TodoPatch`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T: Clone> FieldUpdate<T> {
    /// Apply the update on top of the current value
    pub fn resolve(&self, current: Option<&T>) -> Option<T> {
        match self {
            Self::Keep => current.cloned(),
            Self::Clear => None,
            Self::Set(value) => Some(value.clone()),
        }
    }
}

/// Partial edit of an existing todo.
///
/// Omitted fields are represented distinctly from explicit values:
/// `is_finished: None` preserves the server's flag while `Some(false)`
/// reopens the todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: FieldUpdate<String>,
    pub is_finished: Option<bool>,
    pub cover: Option<CoverUpload>,
}

impl TodoPatch {
    /// Resolve against the client copy into the complete form the server
    /// expects. The server requires a title and clears a missing
    /// description, so both are filled in from `current` when kept.
    pub fn resolve(
        &self,
        current: Option<&Todo>,
    ) -> std::result::Result<UpdateForm, ValidationError> {
        let title = match (&self.title, current) {
            (Some(title), _) => title.clone(),
            (None, Some(todo)) => todo.title.clone(),
            (None, None) => return Err(ValidationError::TitleMissing),
        };
        validate_title(&title)?;

        if let Some(cover) = &self.cover {
            cover.validate()?;
        }

        let current_description = current.and_then(|todo| todo.description.as_ref());

        Ok(UpdateForm {
            title,
            description: self.description.resolve(current_description),
            is_finished: self.is_finished,
            cover: self.cover.clone(),
        })
    }
}

/// Complete update form sent to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateForm {
    pub title: String,
    pub description: Option<String>,
    /// `None` leaves the flag untouched on the server
    pub is_finished: Option<bool>,
    pub cover: Option<CoverUpload>,
}
