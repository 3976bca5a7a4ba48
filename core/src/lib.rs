#![deny(missing_docs)]
//! sched_core: shared building blocks for jobsync (config, state store,
//! logging) and the scheduler job mapping/reconciliation engine.

/// Configuration helpers (AppId, dirs, load_or_init, environment).
pub mod cfg;
/// Reconciliation error type.
pub mod error;
/// Job file model: what a user declares.
pub mod job;
/// Tracing/log initialization helpers.
pub mod logx;
/// Config <-> wire mapping.
pub mod map;
/// Tri-state field presence.
pub mod presence;
/// Validate, submit, read back, delete.
pub mod reconcile;
/// Scheduler REST payloads.
pub mod remote;
/// Hierarchical resource ids.
pub mod resource_id;
/// Order-independent sets with custom identity.
pub mod set;
/// Simple file-backed KV store with serde helpers and job records.
pub mod store;
/// Service transports (local emulator, ARM over HTTPS).
pub mod transport;
/// Pre-reconciliation checks.
pub mod validate;

pub use error::SyncError;
pub use reconcile::{Observed, ReadOutcome, Reconciler};
