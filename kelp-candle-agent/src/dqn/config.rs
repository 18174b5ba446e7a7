//! Configuration of DQN agent.
use super::explorer::EpsilonGreedy;
use crate::{mlp::MlpConfig, model::ModelConfig, opt::OptimizerConfig, Activation, Device};
use anyhow::Result;
use kelp_core::TransitionStoreConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q> {
    /// Configuration of the action-value network.
    pub model_config: ModelConfig<Q>,

    /// Configuration of the replay buffer.
    pub store_config: TransitionStoreConfig,

    /// Discount factor.
    pub gamma: f64,

    /// Target network is replaced every `replace` learning steps.
    pub replace: usize,

    /// Epsilon-greedy exploration.
    pub explorer: EpsilonGreedy,

    /// The number of discrete actions.
    pub n_actions: usize,

    /// Device.
    pub device: Device,

    /// Seed of the random number generator used for exploration.
    pub seed: u64,
}

impl<Q> Default for DqnConfig<Q> {
    fn default() -> Self {
        Self {
            model_config: ModelConfig::default(),
            store_config: TransitionStoreConfig::default()
                .capacity(50_000)
                .batch_size(32),
            gamma: 0.99,
            replace: 1000,
            explorer: EpsilonGreedy::default(),
            n_actions: 2,
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl DqnConfig<MlpConfig> {
    /// Configuration with an MLP action-value network.
    pub fn mlp(obs_dim: usize, n_actions: usize, units: Vec<i64>, lr: f64) -> Self {
        let q_config = MlpConfig::new(obs_dim as _, units, n_actions as _, Activation::None);
        let store_config = Self::default().store_config.obs_dim(obs_dim).act_dim(1);

        Self::default()
            .model_config(
                ModelConfig::default()
                    .model_config(q_config)
                    .opt_config(OptimizerConfig::Adam { lr }),
            )
            .store_config(store_config)
            .n_actions(n_actions)
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets the configuration of the action-value network.
    pub fn model_config(mut self, v: ModelConfig<Q>) -> Self {
        self.model_config = v;
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

    /// Sets the interval of target network replacement.
    pub fn replace(mut self, v: usize) -> Self {
        self.replace = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the number of discrete actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
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

    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let config = DqnConfig::mlp(4, 2, vec![64, 64], 1e-3)
            .gamma(0.9)
            .replace(10)
            .explorer(EpsilonGreedy::default().eps_dec(1e-3));

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");
        config.save(&path)?;
        let config_ = DqnConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
