//! MADDPG agent: decentralized actors with centralized critics.
mod base;
mod config;
pub use base::Maddpg;
pub use config::MaddpgConfig;
