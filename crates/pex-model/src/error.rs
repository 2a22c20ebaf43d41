use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid event kind for {format}: {input}")]
    InvalidEventKind {
        format: &'static str,
        input: String,
    },
}

impl ModelError {
    pub(crate) fn invalid_kind(format: &'static str, input: impl Into<String>) -> Self {
        ModelError::InvalidEventKind {
            format,
            input: input.into(),
        }
    }
}
