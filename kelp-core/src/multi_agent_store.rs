//! Replay buffer for multi-agent actor-critic methods.
//!
//! [`MultiAgentStore`] keeps two families of columns sharing one write index:
//! centralized columns (joint state, joint next state, per-agent rewards and
//! terminal flags) used by centralized critics, and per-agent columns (local
//! observations, next observations and actions) used by decentralized actors.
mod base;
mod batch;
mod config;
pub use base::MultiAgentStore;
pub use batch::MultiAgentBatch;
pub use config::MultiAgentStoreConfig;
