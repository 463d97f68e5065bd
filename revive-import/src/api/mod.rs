//! HTTP API handlers for revive-import
//!
//! JSON over HTTP for the session lifecycle plus SSE for progress.

pub mod health;
pub mod import_workflow;
pub mod leads;
pub mod sse;

pub use health::health_routes;
pub use import_workflow::import_routes;
pub use leads::lead_routes;
pub use sse::{event_stream, import_event_stream};
