//! Solver interface for the microlp solver
use ::microlp::{ComparisonOp, OptimizationDirection, Variable as LpVariable};
use indexmap::IndexMap;
use log::trace;

use crate::optimize::constraint::Constraint;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Tolerance used when checking constraints that have no terms
const EMPTY_CONSTRAINT_TOLERANCE: f64 = 1e-9;

/// Pure rust simplex and branch and bound solver
#[derive(Clone, Debug, Default)]
pub struct MicrolpSolver {}

impl MicrolpSolver {
    const NAME: &'static str = "microlp";

    fn missing_variable(id: &str) -> SolverError {
        SolverError::Backend {
            solver: Self::NAME,
            message: format!("variable `{id}` is not part of the problem"),
        }
    }
}

impl Solver for MicrolpSolver {
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
        let direction = match problem.objective().sense() {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut lp = ::microlp::Problem::new(direction);

        let mut objective_coefficients = vec![0.; problem.num_variables()];
        for term in problem.objective().terms() {
            let index = problem
                .variable_index(term.variable())
                .ok_or_else(|| Self::missing_variable(term.variable()))?;
            objective_coefficients[index] += term.coefficient();
        }

        let lp_variables: Vec<LpVariable> = problem
            .variables()
            .values()
            .zip(&objective_coefficients)
            .map(|(var, &coef)| match var.variable_type() {
                VariableType::Continuous => {
                    lp.add_var(coef, (var.lower_bound(), var.upper_bound()))
                }
                VariableType::Integer => lp.add_integer_var(
                    coef,
                    (
                        integer_bound(var.lower_bound()),
                        integer_bound(var.upper_bound()),
                    ),
                ),
                VariableType::Binary => lp.add_binary_var(coef),
            })
            .collect();

        for constraint in problem.constraints().values() {
            let terms = constraint
                .get_terms()
                .iter()
                .map(|t| {
                    problem
                        .variable_index(t.variable())
                        .map(|index| (lp_variables[index], t.coefficient()))
                        .ok_or_else(|| Self::missing_variable(t.variable()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            // microlp can't take an empty left hand side, so these are decided here
            if terms.is_empty() {
                if constraint.is_satisfied_by(0., EMPTY_CONSTRAINT_TOLERANCE) {
                    continue;
                }
                trace!("constraint {} can never hold", constraint.get_id());
                return Ok(ProblemSolution::without_values(
                    OptimizationStatus::Infeasible,
                ));
            }

            match constraint {
                Constraint::Equality { equals, .. } => {
                    lp.add_constraint(terms, ComparisonOp::Eq, *equals)
                }
                Constraint::Inequality {
                    lower_bound,
                    upper_bound,
                    ..
                } => {
                    if lower_bound.is_finite() {
                        lp.add_constraint(terms.clone(), ComparisonOp::Ge, *lower_bound);
                    }
                    if upper_bound.is_finite() {
                        lp.add_constraint(terms, ComparisonOp::Le, *upper_bound);
                    }
                }
            }
        }

        match lp.solve() {
            Ok(solution) => {
                let values: IndexMap<String, f64> = problem
                    .variables()
                    .keys()
                    .zip(&lp_variables)
                    .map(|(id, &var)| (id.clone(), solution[var]))
                    .collect();
                Ok(ProblemSolution::optimal(solution.objective(), values))
            }
            Err(::microlp::Error::Infeasible) => Ok(ProblemSolution::without_values(
                OptimizationStatus::Infeasible,
            )),
            Err(::microlp::Error::Unbounded) => Ok(ProblemSolution::without_values(
                OptimizationStatus::Unbounded,
            )),
            Err(err) => Err(SolverError::Backend {
                solver: Self::NAME,
                message: err.to_string(),
            }),
        }
    }
}

/// Convert a floating point bound into the i32 bound microlp expects for integer variables
fn integer_bound(bound: f64) -> i32 {
    if bound.is_nan() {
        0
    } else {
        bound.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// a + b (weight 5, value 9) beats a + c (weight 3, value 8)
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

        let solution = MicrolpSolver::default().solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 9.).abs() < 1e-6);
        assert!((solution.value_of("a").unwrap() - 1.).abs() < 1e-6);
        assert!((solution.value_of("b").unwrap() - 1.).abs() < 1e-6);
        assert!(solution.value_of("c").unwrap().abs() < 1e-6);
    }

    #[test]
    fn solve_infeasible() {
        let mut problem = Problem::new_maximization();
        problem.add_binary_variable("x").unwrap();
        problem.add_binary_variable("y").unwrap();
        problem
            .add_new_equality_constraint_by_id("count", &["x", "y"], &[1., 1.], 3.)
            .unwrap();

        let solution = MicrolpSolver::default().solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.variable_values.is_none());
    }

    #[test]
    fn empty_constraints() {
        let mut problem = Problem::new_maximization();
        problem.add_binary_variable("x").unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        problem
            .add_new_inequality_constraint("always", Vec::new(), 0., 10.)
            .unwrap();
        let solution = MicrolpSolver::default().solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);

        problem
            .add_new_equality_constraint("never", Vec::new(), 1.)
            .unwrap();
        let solution = MicrolpSolver::default().solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
    }

    #[test]
    fn integer_bounds() {
        assert_eq!(integer_bound(f64::INFINITY), i32::MAX);
        assert_eq!(integer_bound(f64::NEG_INFINITY), i32::MIN);
        assert_eq!(integer_bound(3.), 3);
    }
}
