//! Utilities.
use anyhow::{anyhow, Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use kelp_core::Rows;
use log::trace;

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
///
/// With `tau == 1.0` the source values are copied as they are.
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track(tau = {})", tau);
    let dest = dest.data().lock().map_err(|e| anyhow!("{}", e))?;
    let src = src.data().lock().map_err(|e| anyhow!("{}", e))?;

    for (k, v_dest) in dest.iter() {
        let v_src = src
            .get(k)
            .with_context(|| format!("{} is not found in the source", k))?;
        if tau == 1.0 {
            v_dest.set(v_src.as_tensor())?;
        } else {
            let t = ((tau * v_src.as_tensor())? + ((1.0 - tau) * v_dest.as_tensor())?)?;
            v_dest.set(&t)?;
        }
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// Converts rows into a tensor of shape `(n_rows, width)`.
pub fn rows_to_tensor(rows: &Rows<f32>, device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(
        rows.data(),
        (rows.len(), rows.width()),
        device,
    )?)
}

/// Converts a single observation into a tensor of shape `(1, dim)`.
pub fn obs_to_tensor(obs: &[f32], device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(obs, (1, obs.len()), device)?)
}

/// Returns `1 - flag` for each terminal flag as a 1-dimensional tensor.
pub fn not_done(flags: &[i8], device: &Device) -> Result<Tensor> {
    let v = flags.iter().map(|&f| 1f32 - f as f32).collect::<Vec<_>>();
    Ok(Tensor::from_vec(v, (flags.len(),), device)?)
}

/// TD target `r + gamma * (1 - done) * q_next`, detached from the graph.
pub fn td_target(reward: &Tensor, not_done: &Tensor, q_next: &Tensor, gamma: f64) -> Result<Tensor> {
    let bootstrap = (not_done * q_next)?.affine(gamma, 0.)?;
    Ok((reward + bootstrap)?.detach())
}
