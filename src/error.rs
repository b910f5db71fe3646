use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdfError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File is not in EDF format: {0}")]
    NotEdfFormat(String),

    #[error("Invalid value in header field '{field}'")]
    FormatError { field: &'static str },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid number of signals: {0}")]
    InvalidSignalCount(usize),
}

impl EdfError {
    pub(crate) fn field(field: &'static str) -> Self {
        EdfError::FormatError { field }
    }
}

pub type Result<T> = std::result::Result<T, EdfError>;
