//! # Revive Common Library
//!
//! Shared code for the lead revival services:
//! - Common error type
//! - Configuration loading and root folder resolution
//! - Event types (RevivalEvent enum) and the EventBus
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
