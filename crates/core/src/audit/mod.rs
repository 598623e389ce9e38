//! Instrumented execution with an audit trail.
//!
//! Health checks and analyses share one lifecycle: create an audit record,
//! mark it started, run the unit of work, record the outcome. They differ in
//! what happens when the work fails, which callers choose per call with an
//! [`ErrorPolicy`].
//!
//! Audit persistence is strictly best-effort. A failing [`AuditStore`]
//! is logged and otherwise ignored; it never changes what the caller gets
//! back.
//!
//! [`AuditStore`]: crate::store::AuditStore

mod policy;
mod recorder;

pub use policy::ErrorPolicy;
pub use recorder::{AuditRecorder, Correlation, Invocation};
