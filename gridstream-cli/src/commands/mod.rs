//! CLI command implementations.

pub mod common;
pub mod config;
pub mod get;
pub mod ls;
pub mod verify;
