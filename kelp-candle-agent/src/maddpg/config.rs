//! Configuration of MADDPG agent.
use crate::{mlp::MlpConfig, model::ModelConfig, opt::OptimizerConfig, Activation, Device};
use anyhow::Result;
use kelp_core::{error::KelpError, MultiAgentStoreConfig};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Maddpg`](super::Maddpg) agent.
///
/// `actor_configs` and `critic_configs` hold one entry per agent, in the order of
/// `store_config.actor_dims`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MaddpgConfig<P, Q> {
    /// Configurations of the actors, one per agent.
    pub actor_configs: Vec<ModelConfig<P>>,

    /// Configurations of the centralized critics, one per agent.
    pub critic_configs: Vec<ModelConfig<Q>>,

    /// Configuration of the multi-agent replay buffer.
    pub store_config: MultiAgentStoreConfig,

    /// Discount factor.
    pub gamma: f64,

    /// Soft update coefficient.
    pub tau: f64,

    /// Standard deviation of the exploration noise relative to `max_action`.
    pub noise: f64,

    /// Actions of every agent are bounded to `[-max_action, max_action]`.
    pub max_action: f64,

    /// Device.
    pub device: Device,

    /// Seed of the random number generator used for exploration.
    pub seed: u64,
}

impl<P, Q> Default for MaddpgConfig<P, Q> {
    fn default() -> Self {
        Self {
            actor_configs: vec![],
            critic_configs: vec![],
            store_config: MultiAgentStoreConfig::default(),
            gamma: 0.99,
            tau: 0.01,
            noise: 0.1,
            max_action: 1.0,
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl MaddpgConfig<MlpConfig, MlpConfig> {
    /// Configuration with MLP actors and critics.
    ///
    /// Critic `i` takes the joint state concatenated with every agent's action.
    pub fn mlp(
        store_config: MultiAgentStoreConfig,
        units: Vec<i64>,
        alpha: f64,
        beta: f64,
    ) -> Self {
        let joint_act_dim: usize = store_config.n_actions.iter().sum();
        let critic_in = (store_config.critic_dim + joint_act_dim) as i64;
        let actor_configs = store_config
            .actor_dims
            .iter()
            .zip(store_config.n_actions.iter())
            .map(|(&o, &a)| {
                ModelConfig::default()
                    .model_config(MlpConfig::new(
                        o as _,
                        units.clone(),
                        a as _,
                        Activation::Tanh,
                    ))
                    .opt_config(OptimizerConfig::Adam { lr: alpha })
            })
            .collect();
        let critic_configs = (0..store_config.n_agents())
            .map(|_| {
                ModelConfig::default()
                    .model_config(MlpConfig::new(critic_in, units.clone(), 1, Activation::None))
                    .opt_config(OptimizerConfig::Adam { lr: beta })
            })
            .collect();

        Self {
            actor_configs,
            critic_configs,
            store_config,
            ..Self::default()
        }
    }
}

impl<P, Q> MaddpgConfig<P, Q>
where
    P: DeserializeOwned + Serialize,
    Q: DeserializeOwned + Serialize,
{
    /// Sets the configurations of the actors.
    pub fn actor_configs(mut self, v: Vec<ModelConfig<P>>) -> Self {
        self.actor_configs = v;
        self
    }

    /// Sets the configurations of the critics.
    pub fn critic_configs(mut self, v: Vec<ModelConfig<Q>>) -> Self {
        self.critic_configs = v;
        self
    }

    /// Sets the configuration of the replay buffer.
    pub fn store_config(mut self, v: MultiAgentStoreConfig) -> Self {
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

    /// Checks that one actor and one critic are given per agent.
    pub(super) fn validate(&self) -> Result<(), KelpError> {
        let n_agents = self.store_config.n_agents();
        if self.actor_configs.len() != n_agents || self.critic_configs.len() != n_agents {
            return Err(KelpError::InvalidConfig(format!(
                "{} actors and {} critics are given for {} agents",
                self.actor_configs.len(),
                self.critic_configs.len(),
                n_agents
            )));
        }
        Ok(())
    }

    /// Constructs [`MaddpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MaddpgConfig`].
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

    fn store_config() -> MultiAgentStoreConfig {
        MultiAgentStoreConfig::default()
            .critic_dim(6)
            .actor_dims(vec![3, 2])
            .n_actions(vec![2, 1])
    }

    #[test]
    fn test_mlp_dims() {
        let config = MaddpgConfig::mlp(store_config(), vec![16, 16], 1e-3, 1e-3);
        assert!(config.validate().is_ok());
        let critic = config.critic_configs[1].model_config.as_ref().unwrap();
        assert_eq!(critic.in_dim(), 9);
        let actor = config.actor_configs[0].model_config.as_ref().unwrap();
        assert_eq!(actor.in_dim(), 3);
    }

    #[test]
    fn test_validate_lengths() {
        let mut config = MaddpgConfig::mlp(store_config(), vec![16], 1e-3, 1e-3);
        config.critic_configs.pop();
        assert!(matches!(
            config.validate(),
            Err(KelpError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_serde_maddpg_config() -> Result<()> {
        let config = MaddpgConfig::mlp(store_config(), vec![16], 1e-3, 1e-2).tau(0.05);
        let dir = TempDir::new("maddpg_config")?;
        let path = dir.path().join("maddpg_config.yaml");
        config.save(&path)?;
        let config_ = MaddpgConfig::<MlpConfig, MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
