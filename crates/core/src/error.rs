use thiserror::Error;

/// Maximum title length accepted by the server.
pub const TITLE_MAX_CHARS: usize = 255;

/// Maximum cover upload size in KiB.
pub const COVER_MAX_KB: usize = 5120;

/// Cover file extensions accepted by the server.
pub const COVER_EXTENSIONS: [&str; 4] = ["jpeg", "png", "jpg", "gif"];

/// Local, per-field validation failure. No request is sent when one occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title is required")]
    TitleMissing,

    #[error("title must be at most {max} characters (got {len})")]
    TitleTooLong { len: usize, max: usize },

    #[error("cover must be one of jpeg, png, jpg, gif (got {extension:?})")]
    CoverType { extension: String },

    #[error("cover must be at most {max_kb} KB (got {size_kb} KB)")]
    CoverTooLarge { size_kb: usize, max_kb: usize },
}

impl ValidationError {
    /// Form field the error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            Self::TitleMissing | Self::TitleTooLong { .. } => "title",
            Self::CoverType { .. } | Self::CoverTooLarge { .. } => "cover",
        }
    }
}

/// Classified failure of a gateway call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0}")]
    Invalid(ValidationError),

    #[error("validation failed: {message}")]
    Validation { field: Option<String>, message: String },

    #[error("not authorized: {message}")]
    Authorization { message: String },

    #[error("session expired, reload and try again")]
    StaleSession,

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl GatewayError {
    /// Form field to highlight, for validation failures
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Invalid(err) => Some(err.field()),
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

/// Core domain errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid status filter: {value}")]
    InvalidStatus { value: String },
}
