//! PPO agent with a diagonal Gaussian policy.
mod base;
mod config;
mod gaussian;
pub use base::Ppo;
pub use config::PpoConfig;
pub use gaussian::{entropy, log_prob};
