//! Core interfaces.
mod agent;
mod env;
pub use agent::Agent;
pub use env::{Env, Step};
