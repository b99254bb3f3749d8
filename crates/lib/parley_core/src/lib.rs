//! # parley_core
//!
//! Core domain logic for Parley: the scenario catalog, conversation assembly
//! and the Gemini generation client.

pub mod chat;
pub mod conversation;
pub mod gemini;
pub mod generation;
pub mod scenario;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
