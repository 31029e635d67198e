//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A decision variable of an optimization problem
///
/// Variables are normally created through [`VariableBuilder`], or through the
/// `add_new_variable` family of functions on [`Problem`](crate::optimize::problem::Problem).
///
/// # Examples
/// ```rust
/// use wavepick_core::optimize::variable::{VariableBuilder, VariableType};
/// let x = VariableBuilder::default()
///     .id("x")
///     .variable_type(VariableType::Integer)
///     .lower_bound(0.)
///     .upper_bound(20.)
///     .build()
///     .unwrap();
/// assert_eq!(x.id(), "x");
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Variable {
    /// Used to identify the variable, must be unique within a problem
    #[builder(setter(into))]
    pub(crate) id: String,
    /// Type of the variable
    #[builder(default = "VariableType::Continuous")]
    pub(crate) variable_type: VariableType,
    /// Lowest value the variable can take
    #[builder(default = "0.")]
    pub(crate) lower_bound: f64,
    /// Highest value the variable can take
    #[builder(default = "f64::INFINITY")]
    pub(crate) upper_bound: f64,
    /// Position of the variable in the problem, set when the variable is added
    #[builder(setter(skip))]
    pub(crate) index: usize,
}

impl Variable {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn variable_type(&self) -> VariableType {
        self.variable_type
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Index of the variable within the problem it belongs to
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the variable is restricted to integer values
    pub fn is_integral(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.variable_type)
    }
}

/// Represents the type of variable in an optimization problem
///
/// # Notes:
/// Every bundled solver supports all three types
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
    /// Binary Variable
    Binary,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
            VariableType::Binary => write!(f, "BINARY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let x = VariableBuilder::default().id("x").build().unwrap();
        assert_eq!(x.variable_type(), VariableType::Continuous);
        assert!((x.lower_bound() - 0.).abs() < 1e-25);
        assert!(x.upper_bound().is_infinite());
        assert!(!x.is_integral());
    }

    #[test]
    fn builder_requires_id() {
        assert!(VariableBuilder::default().lower_bound(1.).build().is_err());
    }

    #[test]
    fn binary_variable() {
        let y = VariableBuilder::default()
            .id("y_0")
            .variable_type(VariableType::Binary)
            .upper_bound(1.)
            .build()
            .unwrap();
        assert_eq!(y.variable_type(), VariableType::Binary);
        assert!(y.is_integral());
        assert_eq!(format!("{}", y), "y_0:BINARY");
    }
}
