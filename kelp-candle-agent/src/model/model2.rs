use super::{ModelConfig, SubModel2};
use crate::{
    opt::{Optimizer, OptimizerConfig},
    util::track,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// A two-input network owning its parameters and optimizer, typically a critic
/// taking observations and actions.
pub struct Model2<M>
where
    M: SubModel2,
    M::Config: DeserializeOwned + Serialize + Clone,
{
    device: Device,
    varmap: VarMap,
    model_config: M::Config,
    model: M,
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<M> Model2<M>
where
    M: SubModel2,
    M::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`Model2`].
    pub fn build(config: ModelConfig<M::Config>, device: Device) -> Result<Self> {
        let model_config = config.model_config.context("model_config is not set.")?;
        let varmap = VarMap::new();
        let model = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            M::build(vb, model_config.clone())?
        };
        let opt_config = config.opt_config;
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            model_config,
            model,
            opt_config,
            opt,
        })
    }

    /// Builds a network of the same architecture holding a copy of the parameters.
    pub fn target(&self) -> Result<Self> {
        let config = ModelConfig {
            model_config: Some(self.model_config.clone()),
            opt_config: self.opt_config.clone(),
        };
        let tgt = Self::build(config, self.device.clone())?;
        track(&tgt.varmap, &self.varmap, 1.0)?;
        Ok(tgt)
    }

    /// Performs forward computation.
    pub fn forward(&self, x1: &M::Input1, x2: &M::Input2) -> Result<M::Output> {
        self.model.forward(x1, x2)
    }

    /// Applies a gradient step minimizing `loss`.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Parameters of the network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters to `path`.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save critic to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from `path`.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load critic from {:?}", path.as_ref());
        Ok(())
    }
}
