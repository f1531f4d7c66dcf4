//! Shared helpers used across pipeline stages

pub mod fs;
