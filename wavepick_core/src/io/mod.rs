//! Module for reading instances and writing wave reports
use std::path::PathBuf;

use thiserror::Error;

pub mod instance_text;
pub mod report;

/// Errors raised while reading or writing files
#[derive(Error, Debug)]
pub enum IoError {
    /// The file could not be read
    #[error("Could not read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file could not be written
    #[error("Could not write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The instance file is malformed
    #[error("Could not parse instance {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: instance_text::ParseError,
    },
    /// The report could not be serialized
    #[error("Could not serialize report for {path:?}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
