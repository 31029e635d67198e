//! Builds the binary program selecting orders and exactly `k` aisles
//!
//! For an instance and a target aisle count `k` the program is
//!
//! ```text
//! maximize    sum_o units(o) * x_o
//! subject to  sum_a y_a = k                                          (aisle_count)
//!             LB <= sum_o units(o) * x_o <= UB                       (wave_size)
//!             sum_o demand(o, i) * x_o - sum_a supply(a, i) * y_a <= 0  for every item i (item_i)
//!             x_o, y_a in {0, 1}
//! ```
//!
//! where `x_o` selects order `o` and `y_a` visits aisle `a`. Only visited aisles supply items.
use log::trace;

use crate::optimize::constraint::ConstraintTerm;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::ProblemSolution;
use crate::wave::instance::Instance;
use crate::wave::solution::Wave;

/// Id of the constraint fixing the number of aisles
pub const AISLE_COUNT_CONSTRAINT: &str = "aisle_count";
/// Id of the constraint bounding the number of units in the wave
pub const WAVE_SIZE_CONSTRAINT: &str = "wave_size";

/// Threshold above which a binary variable counts as selected
const SELECTED_THRESHOLD: f64 = 0.5;

/// Id of the variable selecting an order
pub fn order_variable_id(order: usize) -> String {
    format!("x_{order}")
}

/// Id of the variable selecting an aisle
pub fn aisle_variable_id(aisle: usize) -> String {
    format!("y_{aisle}")
}

/// Id of the availability constraint of an item
pub fn item_constraint_id(item: usize) -> String {
    format!("item_{item}")
}

/// The program for a fixed aisle count, along with what is needed to decode its solution
#[derive(Debug, Clone)]
pub struct WaveModel {
    problem: Problem,
    aisle_count: usize,
}

impl WaveModel {
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn aisle_count(&self) -> usize {
        self.aisle_count
    }

    /// Turn the variable values of a solution into a [`Wave`]
    ///
    /// Returns None if the solution carries no variable values.
    pub fn decode(&self, instance: &Instance, solution: &ProblemSolution) -> Option<Wave> {
        let values = solution.variable_values.as_ref()?;
        let selected = |id: String| {
            values
                .get(&id)
                .is_some_and(|&value| value > SELECTED_THRESHOLD)
        };
        let orders = instance
            .orders()
            .iter()
            .map(|o| o.id)
            .filter(|&o| selected(order_variable_id(o)))
            .collect();
        let aisles = instance
            .aisles()
            .iter()
            .map(|a| a.id)
            .filter(|&a| selected(aisle_variable_id(a)))
            .collect();
        Some(Wave::from_selection(
            instance,
            orders,
            aisles,
            self.aisle_count,
        ))
    }
}

/// Formulate the program selecting orders and exactly `aisle_count` aisles
///
/// Pure function of its arguments. The program is well-formed for any `aisle_count`,
/// one larger than the number of aisles is simply infeasible.
pub fn formulate(instance: &Instance, aisle_count: usize) -> Result<WaveModel, ProblemError> {
    let mut problem = Problem::new_maximization();

    let mut units_terms = Vec::with_capacity(instance.orders().len());
    for order in instance.orders() {
        let id = order_variable_id(order.id);
        problem.add_binary_variable(&id)?;
        let units = order.total_units() as f64;
        problem.add_new_linear_objective_term_by_id(&id, units)?;
        units_terms.push(ConstraintTerm::new(&id, units));
    }

    let mut aisle_terms = Vec::with_capacity(instance.aisles().len());
    for aisle in instance.aisles() {
        let id = aisle_variable_id(aisle.id);
        problem.add_binary_variable(&id)?;
        aisle_terms.push(ConstraintTerm::new(&id, 1.));
    }

    problem.add_new_equality_constraint(AISLE_COUNT_CONSTRAINT, aisle_terms, aisle_count as f64)?;
    problem.add_new_inequality_constraint(
        WAVE_SIZE_CONSTRAINT,
        units_terms,
        instance.lower_bound() as f64,
        instance.upper_bound() as f64,
    )?;

    for item in instance.item_universe() {
        let demand_terms = instance
            .orders()
            .iter()
            .filter(|o| o.demand.contains_key(&item))
            .map(|o| ConstraintTerm::new(&order_variable_id(o.id), o.demand_for(item) as f64));
        let supply_terms = instance
            .aisles()
            .iter()
            .filter(|a| a.supply_of(item) > 0)
            .map(|a| ConstraintTerm::new(&aisle_variable_id(a.id), -(a.supply_of(item) as f64)));
        problem.add_new_inequality_constraint(
            &item_constraint_id(item),
            demand_terms.chain(supply_terms).collect(),
            f64::NEG_INFINITY,
            0.,
        )?;
    }

    trace!(
        "formulated wave problem for {} aisles: {} variables, {} constraints",
        aisle_count,
        problem.num_variables(),
        problem.num_constraints()
    );
    Ok(WaveModel {
        problem,
        aisle_count,
    })
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::optimize::constraint::Constraint;
    use crate::optimize::objective::ObjectiveSense;
    use crate::optimize::problem::ProblemType;
    use crate::wave::instance::{Aisle, InstanceBuilder, Order};

    fn instance() -> Instance {
        InstanceBuilder::default()
            .orders(vec![
                Order::new(0, IndexMap::from([(0, 3), (2, 1)])),
                Order::new(1, IndexMap::from([(0, 2)])),
            ])
            .aisles(vec![
                Aisle::new(0, IndexMap::from([(0, 3), (5, 9)])),
                Aisle::new(1, IndexMap::from([(0, 2), (2, 4)])),
            ])
            .lower_bound(2)
            .upper_bound(5)
            .build()
            .unwrap()
    }

    #[test]
    fn variables_and_objective() {
        let model = formulate(&instance(), 1).unwrap();
        let problem = model.problem();
        assert_eq!(problem.problem_type(), ProblemType::LinearMixedInteger);
        assert_eq!(
            problem.variables().keys().collect::<Vec<_>>(),
            vec!["x_0", "x_1", "y_0", "y_1"]
        );
        assert_eq!(problem.objective().sense(), ObjectiveSense::Maximize);
        let coefficients: Vec<(&str, f64)> = problem
            .objective()
            .terms()
            .iter()
            .map(|t| (t.variable(), t.coefficient()))
            .collect();
        assert_eq!(coefficients, vec![("x_0", 4.), ("x_1", 2.)]);
    }

    #[test]
    fn constraints() {
        let model = formulate(&instance(), 2).unwrap();
        let constraints = model.problem().constraints();
        // aisle count, wave size and one per demanded item (0 and 2, not 5)
        assert_eq!(
            constraints.keys().collect::<Vec<_>>(),
            vec!["aisle_count", "wave_size", "item_0", "item_2"]
        );
        assert_eq!(
            format!("{}", constraints["aisle_count"]),
            "1*y_0 + 1*y_1 = 2"
        );
        assert_eq!(
            format!("{}", constraints["wave_size"]),
            "2 <= 4*x_0 + 2*x_1 <= 5"
        );
        assert_eq!(
            format!("{}", constraints["item_0"]),
            "3*x_0 + 2*x_1 + -3*y_0 + -2*y_1 <= 0"
        );
        // Aisle 0 doesn't stock item 2, so only aisle 1 can cover it
        assert_eq!(format!("{}", constraints["item_2"]), "1*x_0 + -4*y_1 <= 0");
        match &constraints["item_2"] {
            Constraint::Inequality { lower_bound, .. } => assert!(lower_bound.is_infinite()),
            Constraint::Equality { .. } => panic!("Incorrect constraint type"),
        }
    }

    #[test]
    fn oversized_aisle_count_is_well_formed() {
        let model = formulate(&instance(), 10).unwrap();
        assert_eq!(model.aisle_count(), 10);
        assert_eq!(model.problem().constraints()["aisle_count"].bounds(), (10., 10.));
    }

    #[test]
    fn empty_instance() {
        let instance = InstanceBuilder::default().upper_bound(0).build().unwrap();
        let model = formulate(&instance, 1).unwrap();
        assert_eq!(model.problem().num_variables(), 0);
        assert_eq!(model.problem().num_constraints(), 2);
    }

    #[test]
    fn decode_solution() {
        let instance = instance();
        let model = formulate(&instance, 1).unwrap();
        let values = IndexMap::from([
            ("x_0".to_string(), 0.9999999),
            ("x_1".to_string(), 1e-9),
            ("y_0".to_string(), 0.),
            ("y_1".to_string(), 1.),
        ]);
        let solution = ProblemSolution::optimal(4., values);
        let wave = model.decode(&instance, &solution).unwrap();
        assert_eq!(wave.orders(), &[0]);
        assert_eq!(wave.aisles(), &[1]);
        assert_eq!(wave.objective(), 4);
        assert_eq!(wave.aisle_count(), 1);

        let empty = ProblemSolution::without_values(crate::optimize::OptimizationStatus::Infeasible);
        assert!(model.decode(&instance, &empty).is_none());
    }
}
