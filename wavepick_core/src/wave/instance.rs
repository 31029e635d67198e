//! This module provides the in-memory representation of a wave picking instance
use std::collections::BTreeSet;

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::Serialize;

/// Identifier of a stock keeping item
pub type ItemId = usize;

/// Largest number of units all orders, or all aisles, of an instance may hold together
///
/// Unit counts are handed to the solver as `f64`, which represents every integer up to
/// 2^53 exactly.
pub const MAX_TOTAL_UNITS: u64 = 1 << 53;

/// A customer order, demanding quantities of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Position of the order in the instance
    pub id: usize,
    /// Map of item ids to the quantity demanded
    pub demand: IndexMap<ItemId, u64>,
}

impl Order {
    pub fn new(id: usize, demand: IndexMap<ItemId, u64>) -> Self {
        Order { id, demand }
    }

    /// Total number of units demanded over all items
    pub fn total_units(&self) -> u64 {
        self.demand.values().fold(0, |acc, &q| acc.saturating_add(q))
    }

    /// Quantity of an item demanded, zero if the order doesn't need the item
    pub fn demand_for(&self, item: ItemId) -> u64 {
        self.demand.get(&item).copied().unwrap_or(0)
    }
}

/// A storage aisle, supplying quantities of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aisle {
    /// Position of the aisle in the instance
    pub id: usize,
    /// Map of item ids to the quantity available
    pub supply: IndexMap<ItemId, u64>,
}

impl Aisle {
    pub fn new(id: usize, supply: IndexMap<ItemId, u64>) -> Self {
        Aisle { id, supply }
    }

    /// Quantity of an item available, zero if the aisle doesn't stock the item
    pub fn supply_of(&self, item: ItemId) -> u64 {
        self.supply.get(&item).copied().unwrap_or(0)
    }
}

/// A wave picking instance: orders, aisles and the bounds on the wave size
///
/// Orders and aisles are numbered by their position, starting at 0.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use wavepick_core::wave::instance::{Aisle, InstanceBuilder, Order};
/// let instance = InstanceBuilder::default()
///     .orders(vec![Order::new(0, IndexMap::from([(0, 3)]))])
///     .aisles(vec![Aisle::new(0, IndexMap::from([(0, 5)]))])
///     .lower_bound(1)
///     .upper_bound(4)
///     .build()
///     .unwrap();
/// assert_eq!(instance.item_universe(), vec![0]);
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Instance {
    /// Orders which can be part of the wave
    #[builder(default)]
    orders: Vec<Order>,
    /// Aisles which can be visited
    #[builder(default)]
    aisles: Vec<Aisle>,
    /// Number of items stated in the instance header
    #[builder(default)]
    declared_item_count: usize,
    /// Fewest units the wave may collect
    #[builder(default)]
    lower_bound: u64,
    /// Most units the wave may collect
    upper_bound: u64,
}

impl InstanceBuilder {
    fn validate(&self) -> Result<(), String> {
        let lower_bound = self.lower_bound.unwrap_or_default();
        if let Some(upper_bound) = self.upper_bound {
            if lower_bound > upper_bound {
                return Err(format!(
                    "lower bound {lower_bound} exceeds upper bound {upper_bound}"
                ));
            }
        }
        if let Some(orders) = &self.orders {
            if let Some((pos, order)) = orders.iter().enumerate().find(|(pos, o)| o.id != *pos) {
                return Err(format!("order at position {pos} has id {}", order.id));
            }
        }
        if let Some(aisles) = &self.aisles {
            if let Some((pos, aisle)) = aisles.iter().enumerate().find(|(pos, a)| a.id != *pos) {
                return Err(format!("aisle at position {pos} has id {}", aisle.id));
            }
        }
        let demand = self.orders.iter().flatten().flat_map(|o| o.demand.values());
        if total_units(demand).is_none() {
            return Err(format!("orders demand more than {MAX_TOTAL_UNITS} units"));
        }
        let supply = self.aisles.iter().flatten().flat_map(|a| a.supply.values());
        if total_units(supply).is_none() {
            return Err(format!("aisles supply more than {MAX_TOTAL_UNITS} units"));
        }
        Ok(())
    }
}

/// Sum of quantities, None once it passes [`MAX_TOTAL_UNITS`]
pub(crate) fn total_units<'a>(quantities: impl IntoIterator<Item = &'a u64>) -> Option<u64> {
    quantities
        .into_iter()
        .try_fold(0u64, |acc, &q| acc.checked_add(q).filter(|&t| t <= MAX_TOTAL_UNITS))
}

impl Instance {
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn aisles(&self) -> &[Aisle] {
        &self.aisles
    }

    pub fn order(&self, id: usize) -> Option<&Order> {
        self.orders.get(id)
    }

    pub fn aisle(&self, id: usize) -> Option<&Aisle> {
        self.aisles.get(id)
    }

    pub fn declared_item_count(&self) -> usize {
        self.declared_item_count
    }

    pub fn lower_bound(&self) -> u64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> u64 {
        self.upper_bound
    }

    /// Every item demanded by at least one order, in ascending order
    ///
    /// Items only stocked by aisles are not part of the universe.
    pub fn item_universe(&self) -> Vec<ItemId> {
        self.orders
            .iter()
            .flat_map(|o| o.demand.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
