#![warn(missing_docs)]
//! Experience stores and agent interfaces for reinforcement learning.
//!
//! The crate provides three stores, each feeding a family of update algorithms:
//!
//! * [`TransitionStore`] - a fixed-capacity circular replay buffer of single-agent
//!   transitions, used by off-policy agents such as DQN and DDPG.
//! * [`MultiAgentStore`] - a replay buffer keeping a centralized view and per-agent
//!   views of each environment step in lockstep, used by MADDPG.
//! * [`TrajectoryStore`] - a fixed-horizon on-policy buffer with a shuffled
//!   minibatch generator, used by PPO.
//!
//! Agents and environments interact through the [`Agent`] and [`Env`] traits.
//! Concrete agents live in backend crates such as `kelp-candle-agent`.
pub mod error;
pub mod multi_agent_store;
pub mod record;
pub mod trajectory_store;
pub mod transition_store;
pub mod util;

mod base;
mod rows;
pub use base::{Agent, Env, Step};
pub use multi_agent_store::{MultiAgentBatch, MultiAgentStore, MultiAgentStoreConfig};
pub use rows::Rows;
pub use trajectory_store::{TrajectoryBatch, TrajectoryStore, TrajectoryStoreConfig};
pub use transition_store::{
    TransitionBatch, TransitionRef, TransitionStore, TransitionStoreConfig,
};
