//! # Data Factory
//!
//! Generates synthetic customers and support tickets and upserts them into
//! Postgres for development and demo environments.

pub mod config;
pub mod db;
pub mod error;
pub mod generators;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod telemetry;
