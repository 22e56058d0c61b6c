//! Test utilities and fixtures for solbatch
//!
//! This crate provides shared test helpers for the integration tests
//! (tests/ directories) of the workspace crates.

pub mod fixtures;
pub mod mocks;
pub mod run;
