//! Shared test infrastructure: an in-memory recording transport and catalog
//! fixtures.

#![allow(dead_code)]

pub mod fixtures;
pub mod transport;

pub use fixtures::*;
pub use transport::*;
