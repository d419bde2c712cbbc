//! Candidate screening conversation and its HTTP handlers.

pub mod handlers;
pub mod machine;
pub mod profile;
pub mod prompts;
pub mod questions;
pub mod session;
pub mod validation;
