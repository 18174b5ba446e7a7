use crate::{opt::OptimizerConfig, util::OutDim};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Model1`](super::Model1) and [`Model2`](super::Model2).
pub struct ModelConfig<C> {
    /// Configuration of the network.
    pub model_config: Option<C>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<C> Default for ModelConfig<C> {
    fn default() -> Self {
        Self {
            model_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<C> ModelConfig<C>
where
    C: DeserializeOwned + Serialize,
{
    /// Sets configurations of the network.
    pub fn model_config(mut self, v: C) -> Self {
        self.model_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`ModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ModelConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

impl<C> ModelConfig<C>
where
    C: DeserializeOwned + Serialize + OutDim,
{
    /// Sets output dimension of the network.
    pub fn out_dim(mut self, v: i64) -> Self {
        if let Some(model_config) = &mut self.model_config {
            model_config.set_out_dim(v);
        }
        self
    }
}
