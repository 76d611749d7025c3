//! Application layer orchestrating domain logic and infrastructure.

pub mod assemble;
pub mod collect;
pub mod extract;
pub mod guard;
pub mod render;
pub mod walk;
pub mod workflow;
