use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::HaplogroupKind;

#[derive(Debug, Error, Diagnostic)]
pub enum HaploError {
    #[error("failed to read input {path}: {message}")]
    InputRead { path: PathBuf, message: String },

    #[error("failed to parse input: {0}")]
    InputParse(String),

    #[error("input contains no sample rows: {0}")]
    EmptyInput(PathBuf),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("no valid age values found in column '{0}'")]
    NoValidAge(String),

    #[error("{kind} haplogroup column '{column}' not found in input")]
    MissingHaplogroupColumn { kind: HaplogroupKind, column: String },

    #[error("no valid {0} haplogroup entries after classification")]
    NoHaplogroupData(HaplogroupKind),

    #[error("failed to write output {path}: {message}")]
    OutputWrite { path: PathBuf, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid delimiter: {0}")]
    InvalidDelimiter(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl HaploError {
    /// Errors raised before aggregation starts because the input cannot
    /// support a frequency table at all.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            HaploError::InputRead { .. }
                | HaploError::InputParse(_)
                | HaploError::EmptyInput(_)
                | HaploError::MissingColumns(_)
                | HaploError::NoValidAge(_)
                | HaploError::MissingHaplogroupColumn { .. }
        )
    }
}
