//! Core rust implementation of wavepick, a crate for selecting picking waves in a warehouse.
//!
//! A wave is a set of orders released together with the aisles visited to pick them. The
//! best wave collects the most units per visited aisle, found by solving a binary program
//! for every possible number of aisles.

pub mod batch;
pub mod configuration;
pub mod io;
pub mod optimize;
pub mod wave;
