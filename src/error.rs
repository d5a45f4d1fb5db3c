// ⚠️ Error Types - Patron Registry
// One error enum for the library; the binary wraps it in anyhow

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Import source does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Read failure while opening or streaming a source
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A patron with this id is already in the registry
    #[error("Duplicate ID: {0}")]
    DuplicateId(String),

    #[error("No patron found with ID {0}")]
    PatronNotFound(String),

    /// A field failed its validation rule
    #[error("Invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Interactive input reached end of stream
    #[error("Input closed")]
    InputClosed,
}

impl RegistryError {
    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        RegistryError::InvalidField {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
