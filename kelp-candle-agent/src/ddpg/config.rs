//! Configuration of DDPG agent.
use crate::{mlp::MlpConfig, model::ModelConfig, opt::OptimizerConfig, Activation, Device};
use anyhow::Result;
use kelp_core::TransitionStoreConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ddpg`](super::Ddpg) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DdpgConfig<P, Q> {
    /// Configuration of the actor. Its outputs are expected in `[-1, 1]`.
    pub actor_config: ModelConfig<P>,

    /// Configuration of the critic.
    pub critic_config: ModelConfig<Q>,

    /// Configuration of the replay buffer.
    pub store_config: TransitionStoreConfig,

    /// Discount factor.
    pub gamma: f64,

    /// Soft update coefficient.
    pub tau: f64,

    /// Standard deviation of the exploration noise.
    pub noise: f64,

    /// Actions are bounded to `[-max_action, max_action]`.
    pub max_action: f64,

    /// Device.
    pub device: Device,

    /// Seed of the random number generator used for exploration.
    pub seed: u64,
}

impl<P, Q> Default for DdpgConfig<P, Q> {
    fn default() -> Self {
        Self {
            actor_config: ModelConfig::default(),
            critic_config: ModelConfig::default(),
            store_config: TransitionStoreConfig::default()
                .capacity(1_000_000)
                .batch_size(100),
            gamma: 0.99,
            tau: 0.005,
            noise: 0.1,
            max_action: 1.0,
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl DdpgConfig<MlpConfig, MlpConfig> {
    /// Configuration with MLP actor and critic sharing hidden layer sizes.
    pub fn mlp(
        obs_dim: usize,
        act_dim: usize,
        max_action: f64,
        units: Vec<i64>,
        actor_lr: f64,
        critic_lr: f64,
    ) -> Self {
        let (o, a) = (obs_dim as i64, act_dim as i64);
        let actor_config = ModelConfig::default()
            .model_config(MlpConfig::new(o, units.clone(), a, Activation::Tanh))
            .opt_config(OptimizerConfig::Adam { lr: actor_lr });
        let critic_config = ModelConfig::default()
            .model_config(MlpConfig::new(o + a, units, 1, Activation::None))
            .opt_config(OptimizerConfig::Adam { lr: critic_lr });
        let store_config = Self::default()
            .store_config
            .obs_dim(obs_dim)
            .act_dim(act_dim);

        Self::default()
            .actor_config(actor_config)
            .critic_config(critic_config)
            .store_config(store_config)
            .max_action(max_action)
    }
}

impl<P, Q> DdpgConfig<P, Q>
where
    P: DeserializeOwned + Serialize,
    Q: DeserializeOwned + Serialize,
{
    /// Sets the configuration of the actor.
    pub fn actor_config(mut self, v: ModelConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Sets the configuration of the critic.
    pub fn critic_config(mut self, v: ModelConfig<Q>) -> Self {
        self.critic_config = v;
        self
    }

    /// Sets the configuration of the replay buffer.
    pub fn store_config(mut self, v: TransitionStoreConfig) -> Self {
        self.store_config = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the standard deviation of the exploration noise.
    pub fn noise(mut self, v: f64) -> Self {
        self.noise = v;
        self
    }

    /// Sets the action bound.
    pub fn max_action(mut self, v: f64) -> Self {
        self.max_action = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`DdpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DdpgConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
