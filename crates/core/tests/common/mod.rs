//! Common test utilities shared by the integration suites.
//!
//! This module provides:
//! - Fixtures (engines wired to mocks, definitions, sample projects)
//! - Custom assertions
//! - Mock collaborators and test node handlers

pub mod assertions;
pub mod fixtures;
pub mod mock_collaborators;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_collaborators::*;
