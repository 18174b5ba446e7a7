//! Configuration of PPO agent.
use crate::{mlp::MlpConfig, model::ModelConfig, opt::OptimizerConfig, Activation, Device};
use anyhow::Result;
use kelp_core::TrajectoryStoreConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ppo`](super::Ppo) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PpoConfig<P, V> {
    /// Configuration of the policy network.
    pub actor_config: ModelConfig<P>,

    /// Configuration of the value network.
    pub critic_config: ModelConfig<V>,

    /// Configuration of the rollout buffer.
    pub store_config: TrajectoryStoreConfig,

    /// Discount factor.
    pub gamma: f64,

    /// Lambda of generalized advantage estimation.
    pub gae_lambda: f64,

    /// The policy ratio is clipped to `[1 - policy_clip, 1 + policy_clip]`.
    pub policy_clip: f64,

    /// The number of passes over a rollout.
    pub n_epochs: usize,

    /// Weight of the entropy bonus.
    pub entropy_coefficient: f64,

    /// Device.
    pub device: Device,

    /// Seed of the random number generator used for sampling actions.
    pub seed: u64,
}

impl<P, V> Default for PpoConfig<P, V> {
    fn default() -> Self {
        Self {
            actor_config: ModelConfig::default(),
            critic_config: ModelConfig::default(),
            store_config: TrajectoryStoreConfig::default(),
            gamma: 0.99,
            gae_lambda: 0.95,
            policy_clip: 0.2,
            n_epochs: 15,
            entropy_coefficient: 1e-3,
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl PpoConfig<MlpConfig, MlpConfig> {
    /// Configuration with an MLP Gaussian policy and an MLP value function.
    pub fn mlp(obs_dim: usize, act_dim: usize, units: Vec<i64>, lr: f64) -> Self {
        let (o, a) = (obs_dim as i64, act_dim as i64);
        let actor_config = ModelConfig::default()
            .model_config(MlpConfig::new(o, units.clone(), a, Activation::None))
            .opt_config(OptimizerConfig::Adam { lr });
        let critic_config = ModelConfig::default()
            .model_config(MlpConfig::new(o, units, 1, Activation::None))
            .opt_config(OptimizerConfig::Adam { lr });
        let store_config = TrajectoryStoreConfig::default()
            .obs_dim(obs_dim)
            .act_dim(act_dim);

        Self::default()
            .actor_config(actor_config)
            .critic_config(critic_config)
            .store_config(store_config)
    }
}

impl<P, V> PpoConfig<P, V>
where
    P: DeserializeOwned + Serialize,
    V: DeserializeOwned + Serialize,
{
    /// Sets the configuration of the policy network.
    pub fn actor_config(mut self, v: ModelConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Sets the configuration of the value network.
    pub fn critic_config(mut self, v: ModelConfig<V>) -> Self {
        self.critic_config = v;
        self
    }

    /// Sets the configuration of the rollout buffer.
    pub fn store_config(mut self, v: TrajectoryStoreConfig) -> Self {
        self.store_config = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets lambda of GAE.
    pub fn gae_lambda(mut self, v: f64) -> Self {
        self.gae_lambda = v;
        self
    }

    /// Sets the clipping range of the policy ratio.
    pub fn policy_clip(mut self, v: f64) -> Self {
        self.policy_clip = v;
        self
    }

    /// Sets the number of epochs.
    pub fn n_epochs(mut self, v: usize) -> Self {
        self.n_epochs = v;
        self
    }

    /// Sets the weight of the entropy bonus.
    pub fn entropy_coefficient(mut self, v: f64) -> Self {
        self.entropy_coefficient = v;
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

    /// Constructs [`PpoConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PpoConfig`].
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
    fn test_default_hyperparameters() {
        let config = PpoConfig::mlp(3, 1, vec![128, 128], 3e-4);
        assert_eq!(config.store_config.horizon, 2048);
        assert_eq!(config.store_config.num_mini_batch, 32);
        assert_eq!(config.n_epochs, 15);
        assert_eq!(config.gae_lambda, 0.95);
        assert_eq!(config.policy_clip, 0.2);
        assert_eq!(config.actor_config.opt_config.lr(), 3e-4);
    }

    #[test]
    fn test_serde_ppo_config() -> Result<()> {
        let config = PpoConfig::mlp(3, 2, vec![64], 1e-3).n_epochs(4).seed(7);
        let dir = TempDir::new("ppo_config")?;
        let path = dir.path().join("ppo_config.yaml");
        config.save(&path)?;
        let config_ = PpoConfig::<MlpConfig, MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
