//! Interfaces to the mixed integer solvers used to optimize a [`Problem`]
//!
//! Every backend implements [`Solver`]. The pure rust `microlp` backend is always
//! available, HiGHS requires the `highs` feature.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::optimize::problem::Problem;
use crate::optimize::variable::VariableType;
use crate::optimize::ProblemSolution;

#[cfg(feature = "highs")]
pub mod highs;
pub mod microlp;

/// An exact solver for linear and mixed integer problems
///
/// Implementations must solve every problem independently, no state may be carried
/// from one call of [`Solver::solve`] to the next.
pub trait Solver: Send + Sync {
    /// Short name of the backend, used in diagnostics
    fn name(&self) -> &'static str;

    /// Whether the solver accepts integer variables
    fn integer_variable_capable(&self) -> bool;

    /// Whether the solver accepts binary variables
    fn binary_variable_capable(&self) -> bool;

    /// Check that every variable of the problem has a type this solver handles
    fn check_support(&self, problem: &Problem) -> Result<(), SolverError> {
        let unsupported = problem.variables().values().find(|var| match var.variable_type() {
            VariableType::Continuous => false,
            VariableType::Integer => !self.integer_variable_capable(),
            VariableType::Binary => !self.binary_variable_capable(),
        });
        match unsupported {
            Some(var) => Err(SolverError::UnsupportedVariableType {
                solver: self.name(),
                variable_type: var.variable_type().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Solve the problem to optimality
    ///
    /// # Returns
    /// - `Ok`: A [`ProblemSolution`], whose status may be non-optimal (infeasible,
    ///     unbounded, ...) in which case it carries no values.
    /// - `Err`: The backend could not process the problem at all.
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Errors raised by a solver backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The problem contains a variable type the backend can't handle
    #[error("The {solver} solver does not support {variable_type} variables")]
    UnsupportedVariableType {
        solver: &'static str,
        variable_type: String,
    },
    /// The backend failed internally
    #[error("The {solver} solver failed: {message}")]
    Backend {
        solver: &'static str,
        message: String,
    },
    /// The backend was requested but not compiled in
    #[error("The {0} solver is not available, rebuild with the `{0}` feature enabled")]
    Unavailable(&'static str),
}

/// Enum used to specify which solver to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverBackend {
    /// Use the pure rust microlp branch and bound solver
    Microlp,
    /// Use the HiGHS solver, requires the highs feature to be enabled
    Highs,
}

impl SolverBackend {
    /// Create the solver for this backend
    pub fn build(self) -> Result<Box<dyn Solver>, SolverError> {
        match self {
            SolverBackend::Microlp => Ok(Box::new(microlp::MicrolpSolver::default())),
            SolverBackend::Highs => {
                cfg_if::cfg_if! {
                    if #[cfg(feature = "highs")] {
                        Ok(Box::new(highs::HighsSolver::default()))
                    } else {
                        Err(SolverError::Unavailable("highs"))
                    }
                }
            }
        }
    }
}

impl Default for SolverBackend {
    fn default() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "highs")] {
                SolverBackend::Highs
            } else {
                SolverBackend::Microlp
            }
        }
    }
}

impl Display for SolverBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverBackend::Microlp => write!(f, "microlp"),
            SolverBackend::Highs => write!(f, "highs"),
        }
    }
}

impl FromStr for SolverBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "microlp" => Ok(SolverBackend::Microlp),
            "highs" => Ok(SolverBackend::Highs),
            other => Err(format!(
                "unknown solver `{other}`, expected one of: microlp, highs"
            )),
        }
    }
}
