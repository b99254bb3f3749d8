//! Request handlers.

pub mod chat;
pub mod scenarios;
pub mod status;
pub mod welcome;
