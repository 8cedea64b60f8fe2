//! Error taxonomy for the pipeline and its file edges.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Fatal errors. Anything that reaches `main` as one of these ends the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{dataset} dataset is empty")]
    MissingInput { dataset: &'static str },

    #[error("{dataset} CSV has no \"{column}\" column")]
    MissingColumn {
        dataset: &'static str,
        column: &'static str,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot access \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A CSV row that could not be turned into a record. The row is dropped and
/// the rest of the file is still read.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct RowError {
    /// 1-based line in the source file, header included.
    pub line: usize,
    /// Column that failed, when one is to blame.
    pub field: Option<String>,
    pub message: String,
}

impl RowError {
    pub fn new(line: usize, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            line,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = PipelineError::MissingInput { dataset: "observations" };
        assert_eq!(err.to_string(), "observations dataset is empty");

        let err = PipelineError::io(
            "data/missing.csv",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("data/missing.csv"));

        let row = RowError::new(7, Some("power"), "invalid number \"n/a\"");
        assert_eq!(row.to_string(), "line 7: invalid number \"n/a\"");
        assert_eq!(row.field.as_deref(), Some("power"));
    }
}
