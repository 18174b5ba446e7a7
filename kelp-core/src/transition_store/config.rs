//! Configuration of [`TransitionStore`](super::TransitionStore).
use crate::error::KelpError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`TransitionStore`](super::TransitionStore).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TransitionStoreConfig {
    /// The number of transitions kept before the oldest is overwritten.
    pub capacity: usize,

    /// Batch size used by [`ready()`](super::TransitionStore::ready).
    pub batch_size: usize,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions. Use 1 for discrete actions.
    pub act_dim: usize,

    /// Seed of the random number generator used for sampling.
    pub seed: u64,
}

impl Default for TransitionStoreConfig {
    fn default() -> Self {
        Self {
            capacity: 50_000,
            batch_size: 32,
            obs_dim: 1,
            act_dim: 1,
            seed: 42,
        }
    }
}

impl TransitionStoreConfig {
    /// Sets the capacity of the store.
    pub fn capacity(mut self, v: usize) -> Self {
        self.capacity = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the dimension of observations.
    pub fn obs_dim(mut self, v: usize) -> Self {
        self.obs_dim = v;
        self
    }

    /// Sets the dimension of actions.
    pub fn act_dim(mut self, v: usize) -> Self {
        self.act_dim = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
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
        if self.obs_dim == 0 || self.act_dim == 0 {
            return Err(KelpError::InvalidConfig(
                "obs_dim and act_dim must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Constructs [`TransitionStoreConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TransitionStoreConfig`] as YAML file.
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
    fn test_serde_transition_store_config() -> Result<()> {
        let config = TransitionStoreConfig::default()
            .capacity(100)
            .batch_size(8)
            .obs_dim(4)
            .act_dim(2)
            .seed(7);

        let dir = TempDir::new("transition_store_config")?;
        let path = dir.path().join("transition_store_config.yaml");
        config.save(&path)?;
        let config_ = TransitionStoreConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(TransitionStoreConfig::default().validate().is_ok());
        assert!(TransitionStoreConfig::default().capacity(0).validate().is_err());
        assert!(TransitionStoreConfig::default()
            .capacity(4)
            .batch_size(5)
            .validate()
            .is_err());
    }
}
