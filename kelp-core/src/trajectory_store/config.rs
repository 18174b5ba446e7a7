//! Configuration of [`TrajectoryStore`](super::TrajectoryStore).
use crate::error::KelpError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`TrajectoryStore`](super::TrajectoryStore).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrajectoryStoreConfig {
    /// The number of steps in a rollout, `T`.
    pub horizon: usize,

    /// The number of minibatches per epoch.
    pub num_mini_batch: usize,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Seed of the random number generator used for shuffling.
    pub seed: u64,
}

impl Default for TrajectoryStoreConfig {
    fn default() -> Self {
        Self {
            horizon: 2048,
            num_mini_batch: 32,
            obs_dim: 1,
            act_dim: 1,
            seed: 42,
        }
    }
}

impl TrajectoryStoreConfig {
    /// Sets the horizon.
    pub fn horizon(mut self, v: usize) -> Self {
        self.horizon = v;
        self
    }

    /// Sets the number of minibatches.
    pub fn num_mini_batch(mut self, v: usize) -> Self {
        self.num_mini_batch = v;
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
        if self.horizon == 0 {
            return Err(KelpError::InvalidConfig("horizon must be positive".into()));
        }
        if self.num_mini_batch == 0 || self.num_mini_batch > self.horizon {
            return Err(KelpError::InvalidConfig(format!(
                "num_mini_batch must be in [1, {}], got {}",
                self.horizon, self.num_mini_batch
            )));
        }
        if self.obs_dim == 0 || self.act_dim == 0 {
            return Err(KelpError::InvalidConfig(
                "obs_dim and act_dim must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Constructs [`TrajectoryStoreConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrajectoryStoreConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
