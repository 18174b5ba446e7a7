//! Configuration of [`MultiAgentStore`](super::MultiAgentStore).
use crate::error::KelpError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`MultiAgentStore`](super::MultiAgentStore).
///
/// The number of agents is the length of `actor_dims`, which must equal the
/// length of `n_actions`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MultiAgentStoreConfig {
    /// The number of steps kept before the oldest is overwritten.
    pub capacity: usize,

    /// Batch size of [`sample_buffer()`](super::MultiAgentStore::sample_buffer).
    pub batch_size: usize,

    /// Dimension of the joint state fed to centralized critics.
    pub critic_dim: usize,

    /// Dimension of each agent's local observation.
    pub actor_dims: Vec<usize>,

    /// Dimension of each agent's action.
    pub n_actions: Vec<usize>,

    /// Seed of the random number generator used for sampling.
    pub seed: u64,
}

impl Default for MultiAgentStoreConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            batch_size: 1024,
            critic_dim: 0,
            actor_dims: vec![],
            n_actions: vec![],
            seed: 42,
        }
    }
}

impl MultiAgentStoreConfig {
    /// Sets the capacity.
    pub fn capacity(mut self, v: usize) -> Self {
        self.capacity = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the dimension of the joint state.
    pub fn critic_dim(mut self, v: usize) -> Self {
        self.critic_dim = v;
        self
    }

    /// Sets the per-agent observation dimensions.
    pub fn actor_dims(mut self, v: Vec<usize>) -> Self {
        self.actor_dims = v;
        self
    }

    /// Sets the per-agent action dimensions.
    pub fn n_actions(mut self, v: Vec<usize>) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// The number of agents.
    pub fn n_agents(&self) -> usize {
        self.actor_dims.len()
    }

    pub(super) fn validate(&self) -> Result<(), KelpError> {
        if self.capacity == 0 {
            return Err(KelpError::InvalidConfig("capacity must be positive".into()));
        }
        if self.batch_size == 0 || self.batch_size > self.capacity {
            return Err(KelpError::InvalidConfig(format!(
                "batch_size must be in [1, {}], got {}",
                self.capacity, self.batch_size
            )));
        }
        if self.actor_dims.is_empty() {
            return Err(KelpError::InvalidConfig("no agents are configured".into()));
        }
        if self.actor_dims.len() != self.n_actions.len() {
            return Err(KelpError::mismatch(
                "n_actions",
                self.actor_dims.len(),
                self.n_actions.len(),
            ));
        }
        if self.critic_dim == 0
            || self.actor_dims.iter().any(|&d| d == 0)
            || self.n_actions.iter().any(|&d| d == 0)
        {
            return Err(KelpError::InvalidConfig(
                "dimensions must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Constructs [`MultiAgentStoreConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MultiAgentStoreConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        let config = MultiAgentStoreConfig::default()
            .capacity(10)
            .batch_size(4)
            .critic_dim(6)
            .actor_dims(vec![3, 3])
            .n_actions(vec![2, 2]);
        assert!(config.validate().is_ok());
        assert_eq!(config.n_agents(), 2);

        let config = config.n_actions(vec![2]);
        assert_eq!(
            config.validate(),
            Err(KelpError::mismatch("n_actions", 2, 1))
        );
        assert!(MultiAgentStoreConfig::default().capacity(10).validate().is_err());
    }
}
