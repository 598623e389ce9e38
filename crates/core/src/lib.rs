//! # ol-core
//!
//! Node-graph execution engine for opsline monitoring pipelines.
//!
//! This crate provides:
//! - Definition validation and sequential execution of node chains
//! - The five built-in node types and the registry that resolves them
//! - The audited-execution wrapper shared by health checks and analyses
//! - Run/stage state machines with operator-triggered retry
//! - Storage traits with an in-memory implementation
//! - Configuration loading from the `.opsline/` directory
//!
//! ## Modules
//!
//! - [`engine`]: Pipeline execution engine
//! - [`nodes`]: Node handler contract, built-in handlers and registry
//! - [`audit`]: Audited execution with per-call error policies
//! - [`collaborators`]: Contracts for checkers, providers, ingestion and channels
//! - [`context`]: Execution context threaded through a run
//! - [`state`]: Run and stage state machines, run manager
//! - [`store`]: Persistence traits and in-memory store
//! - [`redaction`]: Masking of sensitive config values
//! - [`config`]: Configuration loading

pub mod audit;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod engine;
pub mod nodes;
pub mod redaction;
pub mod state;
pub mod store;

pub use context::ExecutionContext;
pub use engine::{EngineError, PipelineEngine};
