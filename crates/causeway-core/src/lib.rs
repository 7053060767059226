//! Shared configuration, errors and constants for the Causeway occurrence
//! tooling.

pub mod config;
pub mod constants;
pub mod error;
