//! DDPG agent with TD3-style clipped Gaussian exploration.
mod base;
mod config;
pub use base::Ddpg;
pub use config::DdpgConfig;
