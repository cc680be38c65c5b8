//! Core types, configuration, errors, and bit-vector utilities

pub mod bitset;
pub mod config;
pub mod error;
pub mod types;
