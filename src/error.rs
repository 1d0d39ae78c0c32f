use thiserror::Error;

#[derive(Debug, Error)]
pub enum HuffError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("input is not in the expected compressed format: {0}")]
    Format(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("checksum mismatch (stored {expected:#010x}, computed {actual:#010x})")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl HuffError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        HuffError::Format(msg.into())
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        HuffError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HuffError>;
