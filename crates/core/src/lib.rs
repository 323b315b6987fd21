//! Pewter Core Library
//!
//! Domain model for the pewter relay: client identity and mirrored brush
//! state, room naming, server configuration, the embedding hook surface,
//! and invariant guardrails. The wire protocol and the relay fabric live
//! in `pewter-net`; this crate holds everything they agree on.

pub mod config;
pub mod error;
pub mod hooks;
pub mod invariants;
pub mod models;
pub mod validate;

pub use config::{ServerConfig, VersionWindow, DEFAULT_PORT};
pub use error::{Error, Result};
pub use hooks::{NoHooks, RelayHooks};
pub use models::*;
