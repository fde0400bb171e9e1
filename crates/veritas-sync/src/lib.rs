//! Sync layer: HTTP client for the hosted actor runtime and analyzers backed
//! by remote actor runs.

pub mod http;
mod remote;

pub use http::{ActorClient, ActorRun, RunStatus, SyncError};
pub use remote::RemoteAnalyzer;
