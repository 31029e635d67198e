use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use wavepick_core::configuration::Configuration;
use wavepick_core::optimize::solvers::SolverBackend;

/// Select the picking wave with the most units per aisle for every instance of a directory
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(short, long, value_name = "FOLDER", default_value = "instances")]
    pub input_dir: PathBuf,
    #[arg(short, long, value_name = "FOLDER", default_value = "output")]
    pub output_dir: PathBuf,
    /// File listing the instance files to process, one name per line, in order
    #[arg(long, value_name = "FILE")]
    pub order_file: Option<PathBuf>,
    /// JSON configuration, flags given on the command line take precedence
    #[arg(short, long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,
    #[arg(short, long, value_name = "[microlp, highs]")]
    pub solver: Option<SolverBackend>,
    /// Solve the aisle counts of an instance concurrently
    #[arg(short, long)]
    pub parallel: bool,
    /// Worker threads for --parallel, defaults to one per core
    #[arg(long, value_name = "N")]
    pub processes: Option<usize>,
    /// Also write a JSON report for every instance
    #[arg(long)]
    pub json: bool,
    #[arg(
        short,
        long,
        value_name = "[off, error, warn, info, debug, trace]",
        default_value = "info"
    )]
    pub log_level: LevelFilter,
}

impl Cli {
    /// Apply the command line flags on top of a configuration
    pub fn apply(&self, config: &mut Configuration) -> Result<()> {
        if let Some(solver) = self.solver {
            config.solver = solver;
        }
        if self.parallel {
            config.parallel = true;
        }
        if let Some(processes) = self.processes {
            config.processes = processes;
        }
        if self.json {
            config.write_json = true;
        }
        if let Some(order_file) = &self.order_file {
            config.file_order = Some(read_order_file(order_file)?);
        }
        Ok(())
    }
}

/// Read the instance file names of an order file, skipping blank lines
pub fn read_order_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read order file {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn flags_override_configuration() {
        let cli = Cli::parse_from(["wavepick", "--solver", "microlp", "-p", "--processes", "3"]);
        let mut config = Configuration::default();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.solver, SolverBackend::Microlp);
        assert!(config.parallel);
        assert_eq!(config.processes, 3);
        assert!(!config.write_json);
        assert_eq!(cli.input_dir, PathBuf::from("instances"));
        assert_eq!(cli.log_level, LevelFilter::Info);
    }

    #[test]
    fn unset_flags_keep_configuration() {
        let cli = Cli::parse_from(["wavepick"]);
        let mut config = Configuration {
            parallel: true,
            write_json: true,
            ..Configuration::default()
        };
        cli.apply(&mut config).unwrap();
        assert!(config.parallel);
        assert!(config.write_json);
        assert_eq!(config.file_order, None);
    }

    #[test]
    fn order_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "instance_0020.txt\n\n  instance_0002.txt  \ninstance_0001.txt").unwrap();
        assert_eq!(
            read_order_file(file.path()).unwrap(),
            vec!["instance_0020.txt", "instance_0002.txt", "instance_0001.txt"]
        );
    }

    #[test]
    fn unknown_solver_is_rejected() {
        assert!(Cli::try_parse_from(["wavepick", "--solver", "cplex"]).is_err());
    }
}
