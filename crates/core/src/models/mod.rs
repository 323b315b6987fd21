//! Data models for the relay

mod client;
mod room;

pub use client::*;
pub use room::*;
