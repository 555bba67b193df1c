//! End-to-end integration tests for the rollapp gateway.
//!
//! See the `tests/` directory. This crate intentionally exports nothing.
