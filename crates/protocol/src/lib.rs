//! # ol-protocol
//!
//! Data contracts shared by the opsline engine and the surfaces that report
//! on it.
//!
//! ## Modules
//!
//! - [`definition_models`]: Pipeline definitions and node specs
//! - [`run_models`]: Persisted pipeline runs, stage executions and their statuses
//! - [`audit_models`]: Audit records for instrumented checker/analysis calls
//! - [`collaborator_models`]: Payloads exchanged with checkers, providers and channels
//! - [`node_outputs`]: Output documents of the built-in node handlers
//! - [`ipc`]: Lifecycle events published by the engine
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: all types derive `TS` for reporting front-ends
//! - Independent compilation: no dependencies on other opsline crates

pub mod audit_models;
pub mod collaborator_models;
pub mod definition_models;
pub mod ipc;
pub mod node_outputs;
pub mod run_models;

// Re-export all public types for convenience
pub use audit_models::*;
pub use collaborator_models::*;
pub use definition_models::*;
pub use ipc::*;
pub use node_outputs::*;
pub use run_models::*;
