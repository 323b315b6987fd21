//! Pewter Relay Network Library
//!
//! TCP relay fabric for the collaborative particle simulation: a framed
//! binary protocol, per-connection sessions, rooms with join replay, and
//! the global client/room registry.
//!
//! # Architecture
//!
//! - **frame**: the wire's two read shapes (exact-length, NUL-terminated)
//! - **protocol**: opcode table and frame builders
//! - **session**: one task per connection: handshake, then dispatch
//! - **room**: membership, operator election, replay, fan-out
//! - **registry**: client and room tables behind a single lock
//! - **server**: accept loop and lifecycle handle
//!
//! # Usage
//!
//! ```ignore
//! let server = RelayServer::listen(ServerConfig::default(), NoHooks).await?;
//! tracing::info!(addr = %server.addr(), "relay up");
//! // ... later
//! server.shutdown().await;
//! ```

pub mod error;
mod frame;
pub mod protocol;
mod registry;
mod room;
pub mod server;
mod session;

pub use error::{Error, Result};
pub use server::RelayServer;
