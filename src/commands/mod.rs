//! Command implementations for the kioskctl CLI

pub mod completions;
pub mod provision;
pub mod verify;
pub mod version;
