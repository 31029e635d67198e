//! Module for constructing and solving optimization problems

pub mod constraint;
pub mod objective;
pub mod problem;
pub mod solvers;
pub mod variable;

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;

/// Struct representing the solution to an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSolution {
    /// The status of the optimization problem, representing if the optimization was
    /// completed successfully
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    ///
    /// Some(f64) if the optimization was completed successfully, None otherwise
    pub objective_value: Option<f64>,
    /// Values of the variables at the optimum,
    ///
    /// Some(IndexMap), keyed by variable id, with values corresponding to variable
    /// values at optimum if the problem could be solved, None otherwise
    pub variable_values: Option<IndexMap<String, f64>>,
}

impl ProblemSolution {
    /// Create a solution for a problem that was solved to optimality
    pub fn optimal(objective_value: f64, variable_values: IndexMap<String, f64>) -> Self {
        ProblemSolution {
            status: OptimizationStatus::Optimal,
            objective_value: Some(objective_value),
            variable_values: Some(variable_values),
        }
    }

    /// Create a solution carrying only a non-optimal status
    pub fn without_values(status: OptimizationStatus) -> Self {
        ProblemSolution {
            status,
            objective_value: None,
            variable_values: None,
        }
    }

    /// Value of a variable at the optimum, None if the problem wasn't solved
    pub fn value_of(&self, variable_id: &str) -> Option<f64> {
        self.variable_values
            .as_ref()
            .and_then(|values| values.get(variable_id).copied())
    }
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptimizationStatus {
    /// Problem has been optimized
    Optimal,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// A numerical error occurred during solving
    NumericalError,
    /// The solver hit the maximum allowed iterations, or max time, or made insufficient progress
    SolverHalted,
}

impl Display for OptimizationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationStatus::Optimal => write!(f, "optimal"),
            OptimizationStatus::Infeasible => write!(f, "infeasible"),
            OptimizationStatus::Unbounded => write!(f, "unbounded"),
            OptimizationStatus::NumericalError => write!(f, "numerical error"),
            OptimizationStatus::SolverHalted => write!(f, "solver halted"),
        }
    }
}
