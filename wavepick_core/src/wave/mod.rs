//! Module for formulating and solving the wave picking problem
//!
//! An [`instance::Instance`] is turned into one binary program per aisle count by
//! [`formulation::formulate`], and [`sweep::AisleSweep`] keeps the [`solution::Wave`]
//! collecting the most units per aisle.

pub mod formulation;
pub mod instance;
pub mod solution;
pub mod sweep;
