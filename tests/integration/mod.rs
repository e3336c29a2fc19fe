//! Integration tests against external services.
//!
//! These tests require Docker for Postgres via testcontainers and are
//! ignored by default.

pub mod postgres_upsert_tests;
