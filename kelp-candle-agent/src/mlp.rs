//! Multilayer perceptron.
mod base;
mod config;
mod gaussian;
use crate::Activation;
use anyhow::Result;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{linear, Linear, Module, VarBuilder};
pub use config::MlpConfig;
pub use gaussian::MlpGaussian;

/// Returns linear layers mapping `in_dim` through `units` to `out_dim`.
fn create_linear_layers(
    prefix: &str,
    vb: VarBuilder,
    in_dim: i64,
    units: &[i64],
    out_dim: i64,
) -> Result<Vec<Linear>> {
    let mut dims = vec![in_dim];
    dims.extend_from_slice(units);
    dims.push(out_dim);
    let vb = vb.pp(prefix);

    let mut layers = Vec::with_capacity(dims.len() - 1);
    for (i, w) in dims.windows(2).enumerate() {
        layers.push(linear(w[0] as _, w[1] as _, vb.pp(format!("ln{}", i)))?);
    }
    Ok(layers)
}

/// Applies the layers with ReLU on hidden layers and `final_act` on the last one.
fn mlp_forward(xs: Tensor, layers: &[Linear], final_act: &Activation) -> Result<Tensor> {
    let (last, hidden) = match layers.split_last() {
        Some(v) => v,
        None => return Ok(xs),
    };
    let mut xs = xs;
    for layer in hidden {
        xs = layer.forward(&xs)?.relu()?;
    }

    Ok(final_act.forward(&last.forward(&xs)?)?)
}
