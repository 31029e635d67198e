//! Solver interface for HiGHS
use ::highs::{Col, HighsModelStatus, RowProblem, Sense};
use indexmap::IndexMap;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// HiGHS mixed integer solver
#[derive(Clone, Debug, Default)]
pub struct HighsSolver {}

impl HighsSolver {
    const NAME: &'static str = "highs";
}

impl Solver for HighsSolver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn integer_variable_capable(&self) -> bool {
        true
    }

    fn binary_variable_capable(&self) -> bool {
        true
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let mut objective_coefficients = vec![0.; problem.num_variables()];
        for term in problem.objective().terms() {
            let index = problem
                .variable_index(term.variable())
                .ok_or_else(|| SolverError::Backend {
                    solver: Self::NAME,
                    message: format!("variable `{}` is not part of the problem", term.variable()),
                })?;
            objective_coefficients[index] += term.coefficient();
        }

        let mut pb = RowProblem::default();
        let columns: Vec<Col> = problem
            .variables()
            .values()
            .zip(&objective_coefficients)
            .map(|(var, &coef)| match var.variable_type() {
                VariableType::Continuous => {
                    pb.add_column(coef, var.lower_bound()..=var.upper_bound())
                }
                VariableType::Integer => {
                    pb.add_integer_column(coef, var.lower_bound()..=var.upper_bound())
                }
                VariableType::Binary => pb.add_integer_column(coef, 0.0..=1.0),
            })
            .collect();

        for constraint in problem.constraints().values() {
            let mut row = Vec::with_capacity(constraint.get_terms().len());
            for term in constraint.get_terms() {
                let index =
                    problem
                        .variable_index(term.variable())
                        .ok_or_else(|| SolverError::Backend {
                            solver: Self::NAME,
                            message: format!(
                                "variable `{}` in constraint `{}` is not part of the problem",
                                term.variable(),
                                constraint.get_id()
                            ),
                        })?;
                row.push((columns[index], term.coefficient()));
            }
            let (lower_bound, upper_bound) = constraint.bounds();
            pb.add_row(lower_bound..=upper_bound, row);
        }

        let sense = match problem.objective().sense() {
            ObjectiveSense::Maximize => Sense::Maximise,
            ObjectiveSense::Minimize => Sense::Minimise,
        };
        let mut model = pb.optimise(sense);
        model.set_option("output_flag", false);
        let solved = model.solve();

        let status = match solved.status() {
            HighsModelStatus::Optimal => OptimizationStatus::Optimal,
            HighsModelStatus::Infeasible => OptimizationStatus::Infeasible,
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                OptimizationStatus::Unbounded
            }
            HighsModelStatus::ReachedTimeLimit | HighsModelStatus::ReachedIterationLimit => {
                OptimizationStatus::SolverHalted
            }
            _ => OptimizationStatus::NumericalError,
        };
        if status != OptimizationStatus::Optimal {
            return Ok(ProblemSolution::without_values(status));
        }

        let solution = solved.get_solution();
        let values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(solution.columns().iter().copied())
            .collect();
        let objective_value = problem
            .objective()
            .evaluate(|id| values.get(id).copied().unwrap_or(0.));
        Ok(ProblemSolution::optimal(objective_value, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_knapsack() {
        let mut problem = Problem::new_maximization();
        for (id, value) in [("a", 5.), ("b", 4.), ("c", 3.)] {
            problem.add_binary_variable(id).unwrap();
            problem.add_new_linear_objective_term_by_id(id, value).unwrap();
        }
        problem
            .add_new_inequality_constraint_by_id(
                "weight",
                &["a", "b", "c"],
                &[2., 3., 1.],
                f64::NEG_INFINITY,
                5.,
            )
            .unwrap();

        let solution = HighsSolver::default().solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 9.).abs() < 1e-6);
    }
}
