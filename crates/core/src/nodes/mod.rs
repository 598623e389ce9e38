//! Node handlers.
//!
//! Every node type implements [`NodeHandler`]. The [`NodeRegistry`] maps
//! the type strings used in definitions to handler instances.
//!
//! | Type | Handler | Fails when |
//! |---|---|---|
//! | `ingest` | [`IngestNode`] | payload invalid or ingestion errors |
//! | `context` | [`ContextNode`] | no checker could be resolved |
//! | `intelligence` | [`IntelligenceNode`] | the provider errors |
//! | `notify` | [`NotifyNode`] | every channel failed |
//! | `transform` | [`TransformNode`] | source output or a path is missing |

mod base;
mod context;
mod error;
mod ingest;
mod intelligence;
mod notify;
mod registry;
mod transform;

pub use base::{ConfigFault, NodeHandler};
pub use context::ContextNode;
pub use error::NodeError;
pub use ingest::IngestNode;
pub use intelligence::IntelligenceNode;
pub use notify::NotifyNode;
pub use registry::{Collaborators, NodeRegistry};
pub use transform::TransformNode;
