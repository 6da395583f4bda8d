//! Integration test crate for the Taskhive marketplace.
//!
//! This crate exists solely to run integration tests that span the ledger
//! and market crates. It has no public API - all functionality is in the
//! test modules.

#![forbid(unsafe_code)]
