//! Provides the candidate wave produced for a fixed aisle count
use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::wave::instance::{Instance, ItemId};

/// A selection of orders and aisles released together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wave {
    /// Ids of the selected orders, ascending
    orders: Vec<usize>,
    /// Ids of the selected aisles, ascending
    aisles: Vec<usize>,
    /// Number of aisles the wave was formulated for
    aisle_count: usize,
    /// Total units collected by the selected orders
    objective: u64,
}

impl Wave {
    /// Create a wave from selected order and aisle ids
    ///
    /// Ids are sorted and deduplicated, the objective is computed from the demand of the
    /// selected orders. Unknown order ids contribute nothing to the objective, they are
    /// reported by [`Wave::validate`].
    pub fn from_selection(
        instance: &Instance,
        mut orders: Vec<usize>,
        mut aisles: Vec<usize>,
        aisle_count: usize,
    ) -> Self {
        orders.sort_unstable();
        orders.dedup();
        aisles.sort_unstable();
        aisles.dedup();
        let objective = orders
            .iter()
            .filter_map(|&o| instance.order(o))
            .map(|o| o.total_units())
            .sum();
        Wave {
            orders,
            aisles,
            aisle_count,
            objective,
        }
    }

    pub fn orders(&self) -> &[usize] {
        &self.orders
    }

    pub fn aisles(&self) -> &[usize] {
        &self.aisles
    }

    pub fn aisle_count(&self) -> usize {
        self.aisle_count
    }

    pub fn objective(&self) -> u64 {
        self.objective
    }

    /// Units collected per aisle visited
    pub fn ratio(&self) -> f64 {
        if self.aisle_count == 0 {
            return 0.;
        }
        self.objective as f64 / self.aisle_count as f64
    }

    /// Exact comparison of the items per aisle ratio of two waves
    ///
    /// Compares `objective / aisle_count` through cross multiplication so equal ratios
    /// compare equal regardless of floating point rounding.
    pub fn cmp_ratio(&self, other: &Wave) -> Ordering {
        let lhs = self.objective as u128 * other.aisle_count as u128;
        let rhs = other.objective as u128 * self.aisle_count as u128;
        lhs.cmp(&rhs)
    }

    /// Whether this wave strictly improves on the ratio of `other`
    pub fn beats(&self, other: &Wave) -> bool {
        self.cmp_ratio(other) == Ordering::Greater
    }

    /// Pick the better of two waves: highest ratio, then fewest aisles
    ///
    /// The result doesn't depend on the argument order, so it can be used to reduce
    /// results that arrive in any order.
    pub fn better(a: Wave, b: Wave) -> Wave {
        match a.cmp_ratio(&b) {
            Ordering::Greater => a,
            Ordering::Less => b,
            Ordering::Equal => {
                if b.aisle_count < a.aisle_count {
                    b
                } else {
                    a
                }
            }
        }
    }

    /// Check the wave against the instance it was built for
    ///
    /// Verifies that exactly `aisle_count` known aisles are selected, every order is known,
    /// the objective lies within the instance bounds, and the selected aisles supply
    /// every item the selected orders demand.
    pub fn validate(&self, instance: &Instance) -> Result<(), WaveError> {
        if self.aisles.len() != self.aisle_count {
            return Err(WaveError::AisleCountMismatch {
                expected: self.aisle_count,
                found: self.aisles.len(),
            });
        }
        if let Some(&o) = self.orders.iter().find(|&&o| instance.order(o).is_none()) {
            return Err(WaveError::UnknownOrder(o));
        }
        if let Some(&a) = self.aisles.iter().find(|&&a| instance.aisle(a).is_none()) {
            return Err(WaveError::UnknownAisle(a));
        }
        if self.objective < instance.lower_bound() || self.objective > instance.upper_bound() {
            return Err(WaveError::OutOfBounds {
                objective: self.objective,
                lower_bound: instance.lower_bound(),
                upper_bound: instance.upper_bound(),
            });
        }

        let mut demand: BTreeMap<ItemId, u64> = BTreeMap::new();
        for order in self.orders.iter().filter_map(|&o| instance.order(o)) {
            for (&item, &quantity) in &order.demand {
                *demand.entry(item).or_default() += quantity;
            }
        }
        for (item, demanded) in demand {
            let supplied: u64 = self
                .aisles
                .iter()
                .filter_map(|&a| instance.aisle(a))
                .map(|a| a.supply_of(item))
                .sum();
            if demanded > supplied {
                return Err(WaveError::ItemShortage {
                    item,
                    demanded,
                    supplied,
                });
            }
        }
        Ok(())
    }
}

/// Reasons a wave is not valid for an instance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaveError {
    #[error("Wave was formulated for {expected} aisles but selects {found}")]
    AisleCountMismatch { expected: usize, found: usize },
    #[error("Wave selects order {0} which is not in the instance")]
    UnknownOrder(usize),
    #[error("Wave selects aisle {0} which is not in the instance")]
    UnknownAisle(usize),
    #[error("Wave collects {objective} units, outside of [{lower_bound}, {upper_bound}]")]
    OutOfBounds {
        objective: u64,
        lower_bound: u64,
        upper_bound: u64,
    },
    #[error("Item {item}: selected orders demand {demanded} units but selected aisles supply {supplied}")]
    ItemShortage {
        item: ItemId,
        demanded: u64,
        supplied: u64,
    },
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::wave::instance::{Aisle, InstanceBuilder, Order};

    /// Orders 0 (3 of item 0) and 1 (2 of item 0), aisles 0 (3 of item 0) and 1 (2 of item 0)
    fn two_by_two() -> Instance {
        InstanceBuilder::default()
            .orders(vec![
                Order::new(0, IndexMap::from([(0, 3)])),
                Order::new(1, IndexMap::from([(0, 2)])),
            ])
            .aisles(vec![
                Aisle::new(0, IndexMap::from([(0, 3)])),
                Aisle::new(1, IndexMap::from([(0, 2)])),
            ])
            .lower_bound(2)
            .upper_bound(5)
            .build()
            .unwrap()
    }

    #[test]
    fn selection_is_normalized() {
        let instance = two_by_two();
        let wave = Wave::from_selection(&instance, vec![1, 0, 1], vec![1, 0], 2);
        assert_eq!(wave.orders(), &[0, 1]);
        assert_eq!(wave.aisles(), &[0, 1]);
        assert_eq!(wave.objective(), 5);
        assert!((wave.ratio() - 2.5).abs() < 1e-12);
        assert_eq!(wave.validate(&instance), Ok(()));
    }

    #[test]
    fn only_selected_aisles_supply() {
        let instance = two_by_two();
        // The fleet holds 5 units of item 0, but aisle 1 alone holds only 2
        let wave = Wave::from_selection(&instance, vec![0], vec![1], 1);
        assert_eq!(
            wave.validate(&instance),
            Err(WaveError::ItemShortage {
                item: 0,
                demanded: 3,
                supplied: 2
            })
        );
    }

    #[test]
    fn invalid_waves() {
        let instance = two_by_two();
        let wave = Wave::from_selection(&instance, vec![0], vec![0, 1], 1);
        assert_eq!(
            wave.validate(&instance),
            Err(WaveError::AisleCountMismatch {
                expected: 1,
                found: 2
            })
        );

        let wave = Wave::from_selection(&instance, vec![], vec![0], 1);
        assert!(matches!(
            wave.validate(&instance),
            Err(WaveError::OutOfBounds { objective: 0, .. })
        ));

        let wave = Wave::from_selection(&instance, vec![0], vec![7], 1);
        assert_eq!(wave.validate(&instance), Err(WaveError::UnknownAisle(7)));

        let wave = Wave::from_selection(&instance, vec![4], vec![0], 1);
        assert_eq!(wave.validate(&instance), Err(WaveError::UnknownOrder(4)));
    }

    #[test]
    fn ratio_comparison_is_exact() {
        let instance = two_by_two();
        let one = Wave::from_selection(&instance, vec![1], vec![1], 1);
        let two = Wave::from_selection(&instance, vec![1, 0], vec![0, 1], 2);
        let three = Wave::from_selection(&instance, vec![0], vec![0], 1);
        // 2/1 against 5/2
        assert!(two.beats(&one));
        assert!(!one.beats(&two));
        assert!(three.beats(&two));

        // Equal ratios: fewer aisles wins whatever the argument order
        let a = Wave {
            orders: vec![0],
            aisles: vec![0],
            aisle_count: 1,
            objective: 3,
        };
        let b = Wave {
            orders: vec![0, 1],
            aisles: vec![0, 1],
            aisle_count: 2,
            objective: 6,
        };
        assert_eq!(a.cmp_ratio(&b), Ordering::Equal);
        assert!(!b.beats(&a));
        assert_eq!(Wave::better(a.clone(), b.clone()).aisle_count(), 1);
        assert_eq!(Wave::better(b, a).aisle_count(), 1);
    }
}
