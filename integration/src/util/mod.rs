//! Test utilities

pub mod transactions;
