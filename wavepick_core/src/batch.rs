//! Runs the aisle count sweep over every instance file of a directory
//!
//! Each file is read, swept and reported on its own. A file that fails to parse or
//! to write doesn't stop the batch, only a directory that can't be listed or created does.
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::configuration::Configuration;
use crate::io::instance_text::read_instance;
use crate::io::IoError;
use crate::io::report::{report_paths, write_json_report, write_report, WaveReport};
use crate::optimize::solvers::Solver;
use crate::wave::solution::Wave;
use crate::wave::sweep::{AisleSweep, SweepError};

const SEPARATOR: &str = "======================================";

/// Which files of the input directory are processed, and in what order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOrder {
    /// Every file named `<prefix>...<suffix>`, sorted by name
    Lexicographic { prefix: String, suffix: String },
    /// Exactly these file names, in this order
    Explicit(Vec<String>),
}

/// Why an instance file could not be processed
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Sweep(#[from] SweepError),
}

/// What happened to one instance file
#[derive(Debug)]
pub enum FileStatus {
    /// A wave was found and its report written
    Written { report: PathBuf, wave: Wave },
    /// No aisle count admits a wave, nothing was written
    NoViableWave,
    /// The file could not be read, solved or reported
    Failed(FileError),
}

/// Outcome of one instance file of a batch
#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub status: FileStatus,
}

impl Display for FileOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            FileStatus::Written { wave, .. } => {
                writeln!(f, "{SEPARATOR}")?;
                writeln!(f, "Arquivo processado: {}", self.file_name)?;
                writeln!(f, "Valor da função objetivo (total de itens): {}", wave.objective())?;
                writeln!(f, "Número de corredores selecionados: {}", wave.aisle_count())?;
                writeln!(f, "Relação (itens por corredor): {:.2}", wave.ratio())?;
                writeln!(f, "Pedidos escolhidos: {:?}", wave.orders())?;
                writeln!(f, "Corredores escolhidos: {:?}", wave.aisles())?;
                write!(f, "{SEPARATOR}")
            }
            FileStatus::NoViableWave => write!(
                f,
                "Arquivo processado: {} - Nenhuma solução viável encontrada.",
                self.file_name
            ),
            FileStatus::Failed(err) => write!(
                f,
                "Arquivo processado: {} - Erro: {}",
                self.file_name,
                error_chain(err)
            ),
        }
    }
}

/// Outcomes of every file of a batch, in processing order
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Written { .. }))
    }

    pub fn no_viable_wave(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::NoViableWave))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&FileStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Errors that stop a batch before any file is processed
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Could not list input directory {path:?}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Input directory {0:?} does not exist")]
    MissingInputDirectory(PathBuf),
    #[error("Could not create output directory {path:?}")]
    CreateOutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Processes the instance files of a directory with one solver and configuration
pub struct BatchRunner<'a> {
    solver: &'a dyn Solver,
    config: Configuration,
}

impl<'a> BatchRunner<'a> {
    pub fn new(solver: &'a dyn Solver, config: Configuration) -> Self {
        BatchRunner { solver, config }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Paths of the instance files to process, in processing order
    pub fn instance_files(&self, input_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
        if !input_dir.is_dir() {
            return Err(BatchError::MissingInputDirectory(input_dir.to_path_buf()));
        }
        match self.config.file_order() {
            FileOrder::Explicit(names) => {
                Ok(names.iter().map(|name| input_dir.join(name)).collect())
            }
            FileOrder::Lexicographic { prefix, suffix } => {
                let list_err = |source: std::io::Error| BatchError::ListDirectory {
                    path: input_dir.to_path_buf(),
                    source,
                };
                let mut files = Vec::new();
                for entry in fs::read_dir(input_dir).map_err(list_err)? {
                    let entry = entry.map_err(list_err)?;
                    let path = entry.path();
                    let matches = path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(&suffix));
                    if matches && path.is_file() {
                        files.push(path);
                    }
                }
                files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
                Ok(files)
            }
        }
    }

    /// Process every instance file of `input_dir`, writing reports into `output_dir`
    ///
    /// `on_outcome` is called as soon as each file is done, before the next starts.
    pub fn run<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        mut on_outcome: F,
    ) -> Result<BatchSummary, BatchError>
    where
        F: FnMut(&FileOutcome),
    {
        let files = self.instance_files(input_dir)?;
        fs::create_dir_all(output_dir).map_err(|source| BatchError::CreateOutputDirectory {
            path: output_dir.to_path_buf(),
            source,
        })?;
        info!(
            "processing {} instance files from {:?} with the {} solver",
            files.len(),
            input_dir,
            self.solver.name()
        );

        let mut summary = BatchSummary::default();
        for path in files {
            let outcome = self.process_file(&path, output_dir);
            on_outcome(&outcome);
            summary.outcomes.push(outcome);
        }
        info!(
            "batch done: {} written, {} without a viable wave, {} failed",
            summary.written(),
            summary.no_viable_wave(),
            summary.failed()
        );
        Ok(summary)
    }

    /// Read, sweep and report on a single instance file
    pub fn process_file(&self, path: &Path, output_dir: &Path) -> FileOutcome {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("processing {file_name}");

        let status = match self.solve_and_report(path, &file_name, output_dir) {
            Ok(status) => status,
            Err(err) => {
                warn!("{file_name}: {}", error_chain(&err));
                FileStatus::Failed(err)
            }
        };
        FileOutcome { file_name, status }
    }

    fn solve_and_report(
        &self,
        path: &Path,
        file_name: &str,
        output_dir: &Path,
    ) -> Result<FileStatus, FileError> {
        let instance = read_instance(path)?;
        info!(
            "{file_name}: {} orders, {} aisles, {} items, bounds [{}, {}]",
            instance.orders().len(),
            instance.aisles().len(),
            instance.item_universe().len(),
            instance.lower_bound(),
            instance.upper_bound()
        );

        let outcome = AisleSweep::new(self.solver, self.config.sweep_options()).run(&instance)?;
        let Some(wave) = outcome.best else {
            info!("{file_name}: no viable wave");
            return Ok(FileStatus::NoViableWave);
        };

        let (report, json_report) = report_paths(output_dir, path);
        write_report(&report, &wave)?;
        if self.config.write_json {
            write_json_report(&json_report, &WaveReport::new(file_name, &wave))?;
        }
        Ok(FileStatus::Written { report, wave })
    }
}

/// Join an error with all of its sources
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
