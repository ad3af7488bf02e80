//! Shared foundation for Pingyu: configuration and small utilities.

pub mod config;
pub mod utils;
