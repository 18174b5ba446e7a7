//! Optimizers applied to the parameters of a [`Model1`](crate::model::Model1) or
//! [`Model2`](crate::model::Model2).
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Serializable choice of optimizer and its hyperparameters.
///
/// Omitted AdamW hyperparameters take the defaults of [`ParamsAdamW`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam with decoupled weight decay, from `candle-nn`.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        #[serde(default = "adamw_beta1")]
        beta1: f64,
        /// Decay rate of the second moment.
        #[serde(default = "adamw_beta2")]
        beta2: f64,
        /// Added to the denominator.
        #[serde(default = "adamw_eps")]
        eps: f64,
        /// Weight decay.
        #[serde(default = "adamw_weight_decay")]
        weight_decay: f64,
    },

    /// Adam, from `candle-optimisers`.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

fn adamw_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn adamw_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn adamw_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn adamw_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 1e-4 }
    }
}

impl OptimizerConfig {
    /// Builds the optimizer over `vars`.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        let opt = match *self {
            Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Optimizer::AdamW(AdamW::new(
                vars,
                ParamsAdamW {
                    lr,
                    beta1,
                    beta2,
                    eps,
                    weight_decay,
                },
            )?),
            Self::Adam { lr } => Optimizer::Adam(Adam::new(
                vars,
                ParamsAdam {
                    lr,
                    ..ParamsAdam::default()
                },
            )?),
        };
        Ok(opt)
    }

    /// The learning rate.
    pub fn lr(&self) -> f64 {
        match *self {
            Self::AdamW { lr, .. } | Self::Adam { lr } => lr,
        }
    }

    /// Replaces the learning rate, keeping the other hyperparameters.
    pub fn learning_rate(mut self, v: f64) -> Self {
        match &mut self {
            Self::AdamW { lr, .. } | Self::Adam { lr } => *lr = v,
        }
        self
    }
}

/// An optimizer owning references to the variables it updates.
pub enum Optimizer {
    /// See [`OptimizerConfig::AdamW`].
    AdamW(AdamW),

    /// See [`OptimizerConfig::Adam`].
    Adam(Adam),
}

impl Optimizer {
    /// Computes gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::AdamW(opt) => opt.backward_step(loss)?,
            Self::Adam(opt) => opt.backward_step(loss)?,
        }
        Ok(())
    }
}
