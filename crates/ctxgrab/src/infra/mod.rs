//! Infrastructure adapters for config, prompts, transport, git, and the reasoning service.

pub mod clipboard;
pub mod config;
pub mod git;
pub mod prompt;
pub mod service;
pub mod staging;
