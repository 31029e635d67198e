//! Provides struct for representing a constraint in an optimization problem
use std::fmt::{Display, Formatter};

/// Represents a linear constraint in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        /// Used to identify the constraint, must be unique within a problem
        id: String,
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint, `lower_bound` <= `terms` <= `upper_bound`
    ///
    /// Either bound may be infinite, making the constraint one-sided
    Inequality {
        /// Used to identify the constraint, must be unique within a problem
        id: String,
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: f64,
        /// The highest value the sum of the terms can take
        upper_bound: f64,
    },
}

impl Constraint {
    /// Create a new equality constraint
    ///
    /// # Parameters
    /// - `id`: Identifier of the constraint
    /// - `terms`: Linear terms of the left hand side
    /// - `equals`: The right hand side of the equality
    ///
    /// # Examples
    /// ```rust
    /// use wavepick_core::optimize::constraint::Constraint;
    /// // Create a constraint representing 3*x + 2*y = 6
    /// let terms = Constraint::zip_into_terms(&["x", "y"], &[3.0, 2.0]);
    /// let new_constraint = Constraint::new_equality("c", terms, 6.);
    /// assert_eq!(format!("{}", new_constraint), "3*x + 2*y = 6");
    /// ```
    pub fn new_equality(id: &str, terms: Vec<ConstraintTerm>, equals: f64) -> Self {
        Constraint::Equality {
            id: id.to_string(),
            terms,
            equals,
        }
    }

    /// Create a new inequality constraint
    ///
    /// # Parameters
    /// - `id`: Identifier of the constraint
    /// - `terms`: Linear terms of the constraint
    /// - `lower_bound`: The lowest value the constraint can take (may be `f64::NEG_INFINITY`)
    /// - `upper_bound`: The highest value the constraint can take (may be `f64::INFINITY`)
    ///
    /// # Examples
    /// ```rust
    /// use wavepick_core::optimize::constraint::Constraint;
    /// // represents the inequality 2 <= 3*x + 2*y <= 6
    /// let terms = Constraint::zip_into_terms(&["x", "y"], &[3.0, 2.0]);
    /// let new_constraint = Constraint::new_inequality("c", terms, 2., 6.);
    /// assert_eq!(format!("{}", new_constraint), "2 <= 3*x + 2*y <= 6");
    /// ```
    pub fn new_inequality(
        id: &str,
        terms: Vec<ConstraintTerm>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Constraint::Inequality {
            id: id.to_string(),
            terms,
            lower_bound,
            upper_bound,
        }
    }

    /// Take a slice of variable ids, and a slice of coefficients and zip
    /// them together into a vec of ConstraintTerms
    pub fn zip_into_terms(variables: &[&str], coefficients: &[f64]) -> Vec<ConstraintTerm> {
        variables
            .iter()
            .zip(coefficients)
            .map(|(var, coef)| ConstraintTerm::new(var, *coef))
            .collect()
    }

    pub fn get_id(&self) -> &str {
        match self {
            Constraint::Equality { id, .. } | Constraint::Inequality { id, .. } => id,
        }
    }

    pub fn get_terms(&self) -> &[ConstraintTerm] {
        match self {
            Constraint::Equality { terms, .. } | Constraint::Inequality { terms, .. } => terms,
        }
    }

    /// Lower and upper bound on the sum of the terms, equal for an equality constraint
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Constraint::Equality { equals, .. } => (*equals, *equals),
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => (*lower_bound, *upper_bound),
        }
    }

    /// Check whether a value of the left hand side satisfies the constraint
    pub fn is_satisfied_by(&self, value: f64, tolerance: f64) -> bool {
        let (lower_bound, upper_bound) = self.bounds();
        value >= lower_bound - tolerance && value <= upper_bound + tolerance
    }

    /// Convert a vector of terms into a String representation
    fn terms_to_string(terms: &[ConstraintTerm]) -> String {
        if terms.is_empty() {
            return "0".to_string();
        }
        terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equality { terms, equals, .. } => {
                write!(f, "{} = {}", Self::terms_to_string(terms), equals)
            }
            Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
                ..
            } => {
                if lower_bound.is_finite() {
                    write!(f, "{} <= ", lower_bound)?;
                }
                write!(f, "{}", Self::terms_to_string(terms))?;
                if upper_bound.is_finite() {
                    write!(f, " <= {}", upper_bound)?;
                }
                Ok(())
            }
        }
    }
}

/// Represents a single term in a constraint, specifically
/// represents the multiplication of the `variable` by the `coefficient`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintTerm {
    /// Id of the [`Variable`](crate::optimize::variable::Variable)
    pub(crate) variable: String,
    /// The coefficient for the variable
    pub(crate) coefficient: f64,
}

impl ConstraintTerm {
    pub fn new(variable: &str, coefficient: f64) -> Self {
        ConstraintTerm {
            variable: variable.to_string(),
            coefficient,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.coefficient, self.variable)
    }
}
