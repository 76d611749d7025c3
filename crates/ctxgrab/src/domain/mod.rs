//! Core data types and the engine error taxonomy.

pub mod errors;
pub mod model;
