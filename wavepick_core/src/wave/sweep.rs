//! Sweeps the aisle count to find the wave with the most units per aisle
//!
//! Every aisle count from 1 to the number of aisles is formulated and solved exactly and
//! independently. The best wave has the highest ratio of units to aisles, ties go to the
//! smallest aisle count.
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::optimize::solvers::Solver;
use crate::optimize::OptimizationStatus;
use crate::wave::formulation::formulate;
use crate::wave::instance::Instance;
use crate::wave::solution::Wave;

/// Options controlling how the sweep runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepOptions {
    /// Solve the aisle counts concurrently
    pub parallel: bool,
    /// Number of worker threads for a parallel sweep, 0 uses the rayon default
    pub processes: usize,
    /// Largest accepted difference between the solver's objective and the recomputed one
    pub integrality_tolerance: f64,
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions {
            parallel: false,
            processes: 0,
            integrality_tolerance: 1e-6,
        }
    }
}

/// What solving the program for one aisle count produced
#[derive(Debug, Clone, PartialEq)]
pub enum KOutcome {
    /// Solved to optimality
    Optimal { objective: u64, ratio: f64 },
    /// No wave with this many aisles exists
    Infeasible,
    /// The solver stopped without a usable answer
    Abnormal(String),
}

/// Diagnostics for one aisle count of the sweep
#[derive(Debug, Clone, PartialEq)]
pub struct KAttempt {
    pub aisle_count: usize,
    pub outcome: KOutcome,
}

impl Display for KAttempt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            KOutcome::Optimal { objective, ratio } => write!(
                f,
                "k={}: optimal, {} units, {:.2} units per aisle",
                self.aisle_count, objective, ratio
            ),
            KOutcome::Infeasible => write!(f, "k={}: infeasible", self.aisle_count),
            KOutcome::Abnormal(reason) => {
                write!(f, "k={}: abnormal termination ({})", self.aisle_count, reason)
            }
        }
    }
}

/// Result of sweeping every aisle count of an instance
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    /// Best wave found, None if no aisle count was solved to optimality
    pub best: Option<Wave>,
    /// One entry per aisle count, ascending
    pub attempts: Vec<KAttempt>,
}

impl SweepOutcome {
    /// Number of aisle counts which ended without a usable answer
    pub fn abnormal_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, KOutcome::Abnormal(_)))
            .count()
    }

    /// Number of aisle counts which were solved to optimality
    pub fn optimal_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, KOutcome::Optimal { .. }))
            .count()
    }
}

/// Errors that prevent the sweep from running at all
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Could not create the worker thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("The {0} solver can't handle the binary variables of a wave program")]
    BinaryVariablesUnsupported(&'static str),
}

/// Drives the formulator and the solver over every aisle count
pub struct AisleSweep<'a> {
    solver: &'a dyn Solver,
    options: SweepOptions,
}

impl<'a> AisleSweep<'a> {
    pub fn new(solver: &'a dyn Solver, options: SweepOptions) -> Self {
        AisleSweep { solver, options }
    }

    /// Sweep the aisle count over `1..=|aisles|` and keep the best wave
    pub fn run(&self, instance: &Instance) -> Result<SweepOutcome, SweepError> {
        if !self.solver.binary_variable_capable() {
            return Err(SweepError::BinaryVariablesUnsupported(self.solver.name()));
        }
        let max_aisles = instance.aisles().len();
        let outcome = if self.options.parallel {
            self.run_parallel(instance, max_aisles)?
        } else {
            self.run_sequential(instance, max_aisles)
        };

        match &outcome.best {
            Some(wave) => info!(
                "best wave uses {} aisles for {} units ({:.2} per aisle), {} of {} aisle counts optimal",
                wave.aisle_count(),
                wave.objective(),
                wave.ratio(),
                outcome.optimal_count(),
                max_aisles
            ),
            None => info!("no aisle count out of {} admits a wave", max_aisles),
        }
        Ok(outcome)
    }

    fn run_sequential(&self, instance: &Instance, max_aisles: usize) -> SweepOutcome {
        let mut best: Option<Wave> = None;
        let mut attempts = Vec::with_capacity(max_aisles);
        for k in 1..=max_aisles {
            let (attempt, wave) = self.solve_for_aisle_count(instance, k);
            attempts.push(attempt);
            if let Some(wave) = wave {
                // Strict improvement only, so an equal ratio keeps the earlier, smaller k
                best = match best {
                    Some(current) if !wave.beats(&current) => Some(current),
                    _ => Some(wave),
                };
            }
        }
        SweepOutcome { best, attempts }
    }

    fn run_parallel(
        &self,
        instance: &Instance,
        max_aisles: usize,
    ) -> Result<SweepOutcome, SweepError> {
        let sweep = || -> Vec<(KAttempt, Option<Wave>)> {
            (1..=max_aisles)
                .into_par_iter()
                .map(|k| self.solve_for_aisle_count(instance, k))
                .collect()
        };
        let results = if self.options.processes > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.processes)
                .build()?
                .install(sweep)
        } else {
            sweep()
        };

        let mut attempts = Vec::with_capacity(results.len());
        let mut best: Option<Wave> = None;
        for (attempt, wave) in results {
            attempts.push(attempt);
            best = match (best, wave) {
                (Some(current), Some(wave)) => Some(Wave::better(current, wave)),
                (current, wave) => current.or(wave),
            };
        }
        Ok(SweepOutcome { best, attempts })
    }

    /// Formulate and solve the program for one aisle count
    fn solve_for_aisle_count(&self, instance: &Instance, k: usize) -> (KAttempt, Option<Wave>) {
        let abnormal = |reason: String| {
            warn!("aisle count {k}: {reason}");
            (
                KAttempt {
                    aisle_count: k,
                    outcome: KOutcome::Abnormal(reason),
                },
                None,
            )
        };

        let model = match formulate(instance, k) {
            Ok(model) => model,
            Err(err) => return abnormal(format!("formulation failed: {err}")),
        };
        let solution = match self
            .solver
            .check_support(model.problem())
            .and_then(|()| self.solver.solve(model.problem()))
        {
            Ok(solution) => solution,
            Err(err) => return abnormal(err.to_string()),
        };

        match solution.status {
            OptimizationStatus::Optimal => {}
            OptimizationStatus::Infeasible => {
                debug!("aisle count {k}: infeasible");
                return (
                    KAttempt {
                        aisle_count: k,
                        outcome: KOutcome::Infeasible,
                    },
                    None,
                );
            }
            status => {
                return abnormal(format!("{} solver reported {status}", self.solver.name()))
            }
        }

        let Some(values) = &solution.variable_values else {
            return abnormal("optimal status without variable values".to_string());
        };
        // Binary values are checked at their rounded value, as they are decoded
        let rounded: IndexMap<String, f64> = values
            .iter()
            .map(|(id, value)| (id.clone(), value.round()))
            .collect();
        let violated = model
            .problem()
            .violated_constraints(&rounded, self.options.integrality_tolerance);
        if !violated.is_empty() {
            return abnormal(format!(
                "solver assignment violates {}",
                violated.join(", ")
            ));
        }
        let Some(wave) = model.decode(instance, &solution) else {
            return abnormal("optimal status without variable values".to_string());
        };
        if let Err(err) = wave.validate(instance) {
            return abnormal(format!("solver assignment is not a valid wave: {err}"));
        }
        if let Some(reported) = solution.objective_value {
            if (reported - wave.objective() as f64).abs() > self.options.integrality_tolerance {
                warn!(
                    "aisle count {k}: solver objective {reported} differs from the {} units of the selected orders",
                    wave.objective()
                );
            }
        }

        debug!(
            "aisle count {k}: {} units, {:.2} per aisle",
            wave.objective(),
            wave.ratio()
        );
        (
            KAttempt {
                aisle_count: k,
                outcome: KOutcome::Optimal {
                    objective: wave.objective(),
                    ratio: wave.ratio(),
                },
            },
            Some(wave),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::optimize::problem::Problem;
    use crate::optimize::solvers::microlp::MicrolpSolver;
    use crate::optimize::solvers::SolverError;
    use crate::optimize::ProblemSolution;
    use crate::wave::formulation::{aisle_variable_id, order_variable_id, AISLE_COUNT_CONSTRAINT};
    use crate::wave::instance::{Aisle, InstanceBuilder, ItemId, Order};

    fn build(
        orders: &[&[(ItemId, u64)]],
        aisles: &[&[(ItemId, u64)]],
        lower_bound: u64,
        upper_bound: u64,
    ) -> Instance {
        InstanceBuilder::default()
            .orders(
                orders
                    .iter()
                    .enumerate()
                    .map(|(id, d)| Order::new(id, d.iter().copied().collect()))
                    .collect(),
            )
            .aisles(
                aisles
                    .iter()
                    .enumerate()
                    .map(|(id, s)| Aisle::new(id, s.iter().copied().collect()))
                    .collect(),
            )
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()
            .unwrap()
    }

    fn run(instance: &Instance, options: SweepOptions) -> SweepOutcome {
        let solver = MicrolpSolver::default();
        AisleSweep::new(&solver, options).run(instance).unwrap()
    }

    #[test]
    fn two_orders_two_aisles() {
        let instance = build(&[&[(0, 3)], &[(0, 2)]], &[&[(0, 3)], &[(0, 2)]], 2, 5);
        let outcome = run(&instance, SweepOptions::default());
        let best = outcome.best.expect("a wave exists");
        assert_eq!(best.aisle_count(), 1);
        assert_eq!(best.objective(), 3);
        assert!((best.ratio() - 3.).abs() < 1e-12);
        assert_eq!(best.orders(), &[0]);
        assert_eq!(best.aisles(), &[0]);

        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(
            outcome.attempts[1].outcome,
            KOutcome::Optimal {
                objective: 5,
                ratio: 2.5
            }
        );
    }

    #[test]
    fn equal_ratios_keep_smallest_aisle_count() {
        // One aisle per order: every k collects 2 units per aisle
        let instance = build(&[&[(0, 2)], &[(1, 2)]], &[&[(0, 2)], &[(1, 2)]], 0, 10);
        for parallel in [false, true] {
            let options = SweepOptions {
                parallel,
                ..SweepOptions::default()
            };
            let best = run(&instance, options).best.unwrap();
            assert_eq!(best.aisle_count(), 1);
            assert_eq!(best.objective(), 2);
        }
    }

    #[test]
    fn supply_comes_from_selected_aisles_only() {
        // The fleet holds 4 units of item 0, but no single aisle holds more than 2
        let instance = build(&[&[(0, 4)]], &[&[(0, 2)], &[(0, 2)], &[(1, 9)]], 1, 10);
        let outcome = run(&instance, SweepOptions::default());
        assert_eq!(outcome.attempts[0].outcome, KOutcome::Infeasible);
        let best = outcome.best.unwrap();
        assert_eq!(best.aisle_count(), 2);
        assert_eq!(best.aisles(), &[0, 1]);
        assert_eq!(best.validate(&instance), Ok(()));
    }

    #[test]
    fn bounds_are_respected() {
        // Only one order fits under the upper bound
        let instance = build(&[&[(0, 3)], &[(0, 3)]], &[&[(0, 10)]], 1, 4);
        let best = run(&instance, SweepOptions::default()).best.unwrap();
        assert_eq!(best.objective(), 3);
        assert_eq!(best.orders().len(), 1);

        // No order reaches the lower bound
        let instance = build(&[&[(0, 3)], &[(1, 3)]], &[&[(0, 10)]], 7, 9);
        let outcome = run(&instance, SweepOptions::default());
        assert!(outcome.best.is_none());
        assert_eq!(outcome.optimal_count(), 0);
    }

    #[test]
    fn no_aisles() {
        let instance = build(&[&[(0, 3)]], &[], 0, 10);
        let outcome = run(&instance, SweepOptions::default());
        assert!(outcome.best.is_none());
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn parallel_matches_sequential() {
        let instance = build(
            &[&[(0, 2), (1, 1)], &[(1, 3)], &[(2, 4)], &[(0, 1), (2, 1)]],
            &[&[(0, 2), (2, 1)], &[(1, 4)], &[(2, 5)], &[(0, 1), (1, 1)]],
            2,
            12,
        );
        let sequential = run(&instance, SweepOptions::default());
        let parallel = run(
            &instance,
            SweepOptions {
                parallel: true,
                processes: 2,
                ..SweepOptions::default()
            },
        );
        let (a, b) = (sequential.best.unwrap(), parallel.best.unwrap());
        assert_eq!(a.aisle_count(), b.aisle_count());
        assert_eq!(a.objective(), b.objective());
        assert_eq!(sequential.attempts.len(), parallel.attempts.len());
        for (x, y) in sequential.attempts.iter().zip(&parallel.attempts) {
            assert_eq!(x.aisle_count, y.aisle_count);
        }
    }

    /// Answers every aisle count from a script, recording the counts it was asked for
    struct ScriptedSolver {
        answers: Vec<Result<OptimizationStatus, SolverError>>,
        calls: Mutex<Vec<usize>>,
    }

    impl Solver for ScriptedSolver {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn integer_variable_capable(&self) -> bool {
            true
        }

        fn binary_variable_capable(&self) -> bool {
            true
        }

        fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
            let k = problem.constraints()[AISLE_COUNT_CONSTRAINT].bounds().0 as usize;
            self.calls.lock().unwrap().push(k);
            match self.answers[k - 1].clone()? {
                OptimizationStatus::Optimal => {
                    // Take the first k aisles and every order
                    let mut values = IndexMap::new();
                    for id in 0..2 {
                        values.insert(order_variable_id(id), 1.);
                    }
                    for id in 0..3 {
                        values.insert(aisle_variable_id(id), if id < k { 1. } else { 0. });
                    }
                    Ok(ProblemSolution::optimal(2., values))
                }
                status => Ok(ProblemSolution::without_values(status)),
            }
        }
    }

    #[test]
    fn abnormal_terminations_are_skipped() {
        let instance = build(&[&[(0, 1)], &[(0, 1)]], &[&[(0, 2)], &[(0, 2)], &[(0, 2)]], 0, 10);
        let solver = ScriptedSolver {
            answers: vec![
                Ok(OptimizationStatus::SolverHalted),
                Err(SolverError::Backend {
                    solver: "scripted",
                    message: "boom".to_string(),
                }),
                Ok(OptimizationStatus::Optimal),
            ],
            calls: Mutex::new(Vec::new()),
        };
        let outcome = AisleSweep::new(&solver, SweepOptions::default())
            .run(&instance)
            .unwrap();
        assert_eq!(*solver.calls.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(outcome.abnormal_count(), 2);
        assert!(matches!(outcome.attempts[0].outcome, KOutcome::Abnormal(_)));
        assert!(matches!(outcome.attempts[1].outcome, KOutcome::Abnormal(_)));
        assert_eq!(outcome.best.unwrap().aisle_count(), 3);
    }

    #[test]
    fn invalid_assignments_are_rejected() {
        // The script claims every order fits, but the upper bound only allows one
        let instance = build(&[&[(0, 1)], &[(0, 1)]], &[&[(0, 2)], &[(0, 2)], &[(0, 2)]], 0, 1);
        let solver = ScriptedSolver {
            answers: vec![
                Ok(OptimizationStatus::Optimal),
                Ok(OptimizationStatus::Infeasible),
                Ok(OptimizationStatus::Infeasible),
            ],
            calls: Mutex::new(Vec::new()),
        };
        let outcome = AisleSweep::new(&solver, SweepOptions::default())
            .run(&instance)
            .unwrap();
        assert!(outcome.best.is_none());
        assert!(matches!(outcome.attempts[0].outcome, KOutcome::Abnormal(_)));
        assert_eq!(outcome.attempts[1].outcome, KOutcome::Infeasible);
    }

    #[test]
    fn solver_without_binary_variables_is_rejected() {
        struct LpOnly;

        impl Solver for LpOnly {
            fn name(&self) -> &'static str {
                "lp-only"
            }

            fn integer_variable_capable(&self) -> bool {
                false
            }

            fn binary_variable_capable(&self) -> bool {
                false
            }

            fn solve(&self, _problem: &Problem) -> Result<ProblemSolution, SolverError> {
                panic!("no program should reach this solver")
            }
        }

        let instance = build(&[&[(0, 1)]], &[&[(0, 2)]], 0, 10);
        let res = AisleSweep::new(&LpOnly, SweepOptions::default()).run(&instance);
        assert!(matches!(
            res,
            Err(SweepError::BinaryVariablesUnsupported("lp-only"))
        ));
    }

    #[test]
    fn attempt_display() {
        let attempt = KAttempt {
            aisle_count: 2,
            outcome: KOutcome::Optimal {
                objective: 5,
                ratio: 2.5,
            },
        };
        assert_eq!(attempt.to_string(), "k=2: optimal, 5 units, 2.50 units per aisle");
    }
}
