//! Common test utilities for torigen-extensions
//!
//! This module provides shared test infrastructure including:
//! - Artifact and catalog builders
//! - Mock evaluator and fetcher implementations
//! - A temporary data root with a ready manager

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod fixtures;
pub mod mocks;

pub use builders::*;
pub use fixtures::*;
pub use mocks::*;
