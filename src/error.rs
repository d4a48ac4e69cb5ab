use std::path::Path;

/// Errors raised while reading corpora, building batches, or loading artifacts
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A corpus line could not be parsed into tokens and labels
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// The 1-based line number in the corpus
        line: usize,

        /// What was wrong with the line
        message: String,
    },

    /// A record uses a label that is not part of the frozen vocabulary
    #[error("record from line {line} uses unknown label {label:?}")]
    Schema {
        /// The line the record was read from
        line: usize,

        /// The offending label
        label: String,
    },

    /// Records could not be assembled into a padded batch
    #[error("unable to batch record from line {line}: {message}")]
    Shape {
        /// The line the record was read from
        line: usize,

        /// What was inconsistent about the record
        message: String,
    },

    /// A corpus, config, vocabulary or model file is missing or unreadable
    #[error("unable to access {path}: {message}")]
    Resource {
        /// The path that failed
        path: String,

        /// The underlying failure
        message: String,
    },

    /// Invalid configuration values
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wrap any displayable failure on the given path as a resource error
    pub fn resource(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Self::Resource {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
