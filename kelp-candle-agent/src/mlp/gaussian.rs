use super::{create_linear_layers, mlp_forward, MlpConfig};
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{init::Init, Linear, VarBuilder};

/// A diagonal Gaussian policy head.
///
/// The mean is given by an MLP, while the log standard deviation is a learnable
/// vector shared by all observations. The forward pass returns `(mean, log_std)`,
/// both of shape `(batch_size, out_dim)`.
pub struct MlpGaussian {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
    log_std: Tensor,
}

impl SubModel1 for MlpGaussian {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = (Tensor, Tensor);

    fn forward(&self, xs: &Self::Input) -> Result<Self::Output> {
        let xs = xs.to_device(&self.device)?;
        let mean = mlp_forward(xs, &self.layers, &self.config.activation_out)?;
        let log_std = self.log_std.broadcast_as(mean.dims())?;
        Ok((mean, log_std))
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let log_std = vb.get_with_hints((1, config.out_dim as usize), "log_std", Init::Const(0.))?;
        let layers = create_linear_layers(
            "mlp",
            vb,
            config.in_dim,
            &config.units,
            config.out_dim,
        )?;

        Ok(Self {
            config,
            device,
            layers,
            log_std,
        })
    }
}
