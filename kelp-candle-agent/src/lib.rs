//! RL agents implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`dqn::Dqn`] - DQN with epsilon-greedy exploration and a hard-synchronized target network.
//! * [`ddpg::Ddpg`] - deterministic actor-critic with Gaussian exploration noise and soft
//!   target updates.
//! * [`maddpg::Maddpg`] - centralized critics and decentralized actors for several agents.
//! * [`ppo::Ppo`] - PPO with GAE, a clipped surrogate objective and a diagonal Gaussian
//!   policy.
//!
//! Every agent owns its experience store from `kelp-core` and implements
//! [`kelp_core::Agent`].
pub mod ddpg;
pub mod dqn;
pub mod maddpg;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod ppo;
pub mod util;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}

/// Activation function applied to the output layer of a network.
#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
pub enum Activation {
    /// Identity.
    None,

    /// ReLU.
    ReLU,

    /// Hyperbolic tangent, which bounds outputs to `[-1, 1]`.
    Tanh,
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Self::None => Ok(xs.clone()),
            Self::ReLU => xs.relu(),
            Self::Tanh => xs.tanh(),
        }
    }
}
