//! Networks used as function approximators by the agents.
//!
//! A network implements [`SubModel1`] (one input, e.g. actors and Q-networks) or
//! [`SubModel2`] (two inputs, e.g. critics of observations and actions). It is built
//! on a [`VarBuilder`] and leaves its parameters in the caller's [`VarMap`].
//! [`Model1`] and [`Model2`] wrap such a network with its [`VarMap`] and optimizer,
//! and are what agents hold.
//!
//! [`VarMap`]: candle_nn::VarMap
mod config;
mod model1;
mod model2;
use anyhow::Result;
use candle_nn::VarBuilder;
pub use config::ModelConfig;
pub use model1::Model1;
pub use model2::Model2;

/// A network with one input.
pub trait SubModel1 {
    /// Configuration of the architecture.
    type Config;

    /// Input type.
    type Input;

    /// Output type.
    type Output;

    /// Registers the parameters in `vb` and constructs the network.
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Forward pass.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;
}

/// A network with two inputs.
pub trait SubModel2 {
    /// Configuration of the architecture.
    type Config;

    /// First input type.
    type Input1;

    /// Second input type.
    type Input2;

    /// Output type.
    type Output;

    /// Registers the parameters in `vb` and constructs the network.
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Forward pass.
    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Self::Output>;
}
