use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every way a graph build or a session rebuild can fail. All of them abort the run.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("missing dataset file: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("could not encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;

impl GraphError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GraphError::Io {
            path: path.into(),
            source,
        }
    }
}
