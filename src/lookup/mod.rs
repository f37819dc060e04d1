//! County lookup request handling.
//!
//! This module handles:
//! - Ordered validation of lookup request bodies
//! - The validated query handed to the store

pub mod guard;

pub use guard::{evaluate, CountyQuery, Rejection, Step, Verdict};
