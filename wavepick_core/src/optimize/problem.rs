//! Provides struct representing an optimization problem
use std::collections::HashSet;

use indexmap::IndexMap;
use thiserror::Error;

use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::{Objective, ObjectiveSense, ObjectiveTerm};
use crate::optimize::variable::{Variable, VariableBuilder, VariableType};

/// An optimization problem
///
/// Variables, constraints and objective terms are validated when they are added, so a
/// `Problem` handed to a [`Solver`](crate::optimize::solvers::Solver) is always well-formed.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
    /// Type of problem
    problem_type: ProblemType,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
            problem_type: ProblemType::LinearContinuous,
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }
    // endregion Creation Functions

    // region Adding Variables
    /// Add a variable to the optimization problem
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<(), ProblemError> {
        self.validate_variable(&variable)?;
        variable.index = self.variables.len();
        if variable.is_integral() {
            self.problem_type = ProblemType::LinearMixedInteger;
        }
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    /// Create a new variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let new_var = VariableBuilder::default()
            .id(id)
            .variable_type(variable_type)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()
            .map_err(|_| ProblemError::InvalidVariableBounds)?;
        self.add_variable(new_var)
    }

    /// Create a new binary variable and add it to the optimization problem
    pub fn add_binary_variable(&mut self, id: &str) -> Result<(), ProblemError> {
        self.add_new_variable(id, VariableType::Binary, 0., 1.)
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(&constraint)?;
        self.constraints
            .insert(constraint.get_id().to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint and add it to the model
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        terms: Vec<ConstraintTerm>,
        equals: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_equality(id, terms, equals))
    }

    /// Create a new equality constraint from slices of variable ids and coefficients,
    /// and add it to the model
    pub fn add_new_equality_constraint_by_id(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        let terms = Constraint::zip_into_terms(variables, coefficients);
        self.add_new_equality_constraint(id, terms, equals)
    }

    /// Create a new inequality constraint and add it to the model
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        terms: Vec<ConstraintTerm>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_inequality(
            id,
            terms,
            lower_bound,
            upper_bound,
        ))
    }

    /// Create a new inequality constraint from slices of variable ids and coefficients,
    /// and add it to the model
    pub fn add_new_inequality_constraint_by_id(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let terms = Constraint::zip_into_terms(variables, coefficients);
        self.add_new_inequality_constraint(id, terms, lower_bound, upper_bound)
    }
    // endregion Adding Constraints

    // region Adding Objective Terms
    /// Add a new term to the objective
    pub fn add_objective_term(&mut self, objective_term: ObjectiveTerm) -> Result<(), ProblemError> {
        if !self.variables.contains_key(&objective_term.variable) {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        if self
            .objective
            .terms()
            .iter()
            .any(|t| t.variable == objective_term.variable)
        {
            return Err(ProblemError::RepeatedVariableInObjective(
                objective_term.variable,
            ));
        }
        self.objective.add_term(objective_term);
        Ok(())
    }

    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term_by_id(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        self.add_objective_term(ObjectiveTerm::new(variable_id, coefficient))
    }
    // endregion Adding Objective Terms

    // region Accessors
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    pub fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Index of the variable with the given id
    pub fn variable_index(&self, id: &str) -> Option<usize> {
        self.variables.get_index_of(id)
    }

    // endregion Accessors

    /// Ids of the constraints which are violated by an assignment of variable values
    ///
    /// Variables missing from `values` are taken to be zero
    pub fn violated_constraints(
        &self,
        values: &IndexMap<String, f64>,
        tolerance: f64,
    ) -> Vec<&str> {
        self.constraints
            .values()
            .filter(|cons| {
                let lhs: f64 = cons
                    .get_terms()
                    .iter()
                    .map(|t| t.coefficient * values.get(&t.variable).copied().unwrap_or(0.))
                    .sum();
                !cons.is_satisfied_by(lhs, tolerance)
            })
            .map(|cons| cons.get_id())
            .collect()
    }

    // region Validation Functions
    /// Check that a variable to be added is valid to add to this problem
    fn validate_variable(&self, variable: &Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists(variable.id.clone()));
        }
        if variable.lower_bound > variable.upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        Ok(())
    }

    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(constraint.get_id()) {
            return Err(ProblemError::ConstraintAlreadyExists(
                constraint.get_id().to_string(),
            ));
        }
        let (lower_bound, upper_bound) = constraint.bounds();
        if lower_bound > upper_bound || lower_bound.is_nan() || upper_bound.is_nan() {
            return Err(ProblemError::InvalidConstraintBounds);
        }
        let mut seen = HashSet::new();
        for term in constraint.get_terms() {
            if !self.variables.contains_key(&term.variable) {
                return Err(ProblemError::NonExistentVariablesInConstraint);
            }
            if !seen.insert(term.variable.as_str()) {
                return Err(ProblemError::RepeatedVariableInConstraint {
                    constraint: constraint.get_id().to_string(),
                    variable: term.variable.clone(),
                });
            }
        }
        Ok(())
    }
    // endregion Validation Functions
}

/// Types of optimization problems
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProblemType {
    /// Problem with linear objectives and constraints, and continuous variables
    LinearContinuous,
    /// Problem with linear objective and constraints, with integer and continuous variables
    LinearMixedInteger,
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add variable `{0}` which has the same id as an existing variable")]
    VariableIdAlreadyExists(String),
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to add a variable with lower_bound>upper_bound")]
    InvalidVariableBounds,
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add constraint `{0}` which has the same id as an existing constraint")]
    ConstraintAlreadyExists(String),
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when trying to add a constraint that contains variables not in the model
    #[error("Tried to add a constraint with variables not in the model")]
    NonExistentVariablesInConstraint,
    /// Error when a constraint lists the same variable in more than one term
    #[error("Variable `{variable}` appears more than once in constraint `{constraint}`")]
    RepeatedVariableInConstraint { constraint: String, variable: String },
    /// Error when trying to add an objective term which includes variables not in the model
    #[error("Tried adding an objective term with variables not in the model")]
    NonExistentVariablesInObjective,
    /// Error when the objective already has a term for the variable
    #[error("Variable `{0}` already has a term in the objective")]
    RepeatedVariableInObjective(String),
}
