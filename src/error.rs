use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingText,
    InvalidNumber,
    OutOfRange,
    InvalidColor,
    InvalidChoice,
}

/// A rejected style parameter. Raised before any image work begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(
        kind: ValidationErrorKind,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum StylerError {
    Validation(ValidationError),
    Processing(anyhow::Error),
}

impl StylerError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StylerError::Validation(_))
    }
}

impl fmt::Display for StylerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StylerError::Validation(err) => write!(f, "invalid style: {}", err),
            StylerError::Processing(err) => write!(f, "image processing failed: {:#}", err),
        }
    }
}

impl std::error::Error for StylerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StylerError::Validation(err) => Some(err),
            StylerError::Processing(err) => Some(err.as_ref()),
        }
    }
}

impl From<ValidationError> for StylerError {
    fn from(err: ValidationError) -> Self {
        StylerError::Validation(err)
    }
}

impl From<anyhow::Error> for StylerError {
    fn from(err: anyhow::Error) -> Self {
        StylerError::Processing(err)
    }
}
