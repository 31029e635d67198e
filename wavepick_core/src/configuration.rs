use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::FileOrder;
use crate::optimize::solvers::SolverBackend;
use crate::wave::sweep::SweepOptions;

/// Settings for a batch run
///
/// Every field has a default, so a configuration file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Backend used to solve each aisle count
    pub solver: SolverBackend,
    /// Solve the aisle counts of an instance concurrently
    pub parallel: bool,
    /// Worker threads for a parallel sweep, 0 lets rayon decide
    pub processes: usize,
    /// Largest accepted gap between the solver's objective and the recomputed one
    pub integrality_tolerance: f64,
    /// Instance files must start with this prefix
    pub file_prefix: String,
    /// Instance files must end with this suffix
    pub file_suffix: String,
    /// Process exactly these files, in this order, instead of listing the directory
    pub file_order: Option<Vec<String>>,
    /// Also write a JSON report next to each text report
    pub write_json: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            solver: SolverBackend::default(),
            parallel: false,
            processes: 0,
            integrality_tolerance: 1e-6,
            file_prefix: "instance_".to_string(),
            file_suffix: ".txt".to_string(),
            file_order: None,
            write_json: false,
        }
    }
}

impl Configuration {
    /// Read a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Configuration =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde can't
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.integrality_tolerance.is_finite() || self.integrality_tolerance < 0. {
            return Err(ConfigError::InvalidTolerance(self.integrality_tolerance));
        }
        Ok(())
    }

    /// Options for the aisle count sweep of every instance
    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            parallel: self.parallel,
            processes: self.processes,
            integrality_tolerance: self.integrality_tolerance,
        }
    }

    /// Order in which the instance files of a directory are processed
    pub fn file_order(&self) -> FileOrder {
        match &self.file_order {
            Some(names) => FileOrder::Explicit(names.clone()),
            None => FileOrder::Lexicographic {
                prefix: self.file_prefix.clone(),
                suffix: self.file_suffix.clone(),
            },
        }
    }
}

/// Errors raised while loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Incorrect configuration file format in {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Integrality tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_is_sequential_lexicographic() {
        let config = Configuration::default();
        assert!(!config.parallel);
        assert_eq!(
            config.file_order(),
            FileOrder::Lexicographic {
                prefix: "instance_".to_string(),
                suffix: ".txt".to_string()
            }
        );
        assert_eq!(config.sweep_options(), SweepOptions::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"solver": "microlp", "parallel": true, "file_order": ["b.txt", "a.txt"]}}"#
        )
        .unwrap();
        let config = Configuration::from_json_file(file.path()).unwrap();
        assert_eq!(config.solver, SolverBackend::Microlp);
        assert!(config.parallel);
        assert_eq!(config.processes, 0);
        assert_eq!(config.file_prefix, "instance_");
        assert_eq!(
            config.file_order(),
            FileOrder::Explicit(vec!["b.txt".to_string(), "a.txt".to_string()])
        );
    }

    #[test]
    fn bad_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"solver": "cplex"}}"#).unwrap();
        assert!(matches!(
            Configuration::from_json_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"integrality_tolerance": -1.0}}"#).unwrap();
        assert!(matches!(
            Configuration::from_json_file(file.path()),
            Err(ConfigError::InvalidTolerance(_))
        ));

        assert!(matches!(
            Configuration::from_json_file("no/such/config.json"),
            Err(ConfigError::Read { .. })
        ));
    }
}
