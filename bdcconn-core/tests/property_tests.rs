//! Property-based tests for the `bdcconn` core library
//!
//! This module contains property-based tests that validate the registry
//! and profile identity invariants against randomized operation sequences.

mod properties;
