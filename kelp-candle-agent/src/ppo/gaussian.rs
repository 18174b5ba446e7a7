//! Diagonal Gaussian densities.
use anyhow::Result;
use candle_core::{shape::D, Tensor};
use std::f64::consts::PI;

/// Log density of `act` under `N(mean, exp(log_std)^2)`, summed over the last axis.
pub fn log_prob(act: &Tensor, mean: &Tensor, log_std: &Tensor) -> Result<Tensor> {
    let log_sqrt_2pi = (2. * PI).sqrt().ln();
    let var = log_std.affine(2., 0.)?.exp()?;
    let sq = (act - mean)?.sqr()?;
    let lp = ((sq / var.affine(2., 0.)?)?.neg()? - log_std)?;
    Ok(lp.affine(1., -log_sqrt_2pi)?.sum(D::Minus1)?)
}

/// Entropy of `N(mean, exp(log_std)^2)`, summed over the last axis.
pub fn entropy(log_std: &Tensor) -> Result<Tensor> {
    let c = 0.5 * (1. + (2. * PI).ln());
    Ok(log_std.affine(1., c)?.sum(D::Minus1)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_standard_normal() -> Result<()> {
        let dev = Device::Cpu;
        let mean = Tensor::zeros((1, 1), candle_core::DType::F32, &dev)?;
        let log_std = Tensor::zeros((1, 1), candle_core::DType::F32, &dev)?;
        let act = Tensor::from_slice(&[1f32], (1, 1), &dev)?;

        let lp = log_prob(&act, &mean, &log_std)?.to_vec1::<f32>()?[0];
        let expected = -0.5 - (2. * std::f32::consts::PI).sqrt().ln();
        assert!((lp - expected).abs() < 1e-5);

        let h = entropy(&log_std)?.to_vec1::<f32>()?[0];
        assert!((h - 1.418_938_5).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_sums_over_action_dims() -> Result<()> {
        let dev = Device::Cpu;
        let mean = Tensor::from_slice(&[0.5f32, -1.0, 0.5, -1.0], (2, 2), &dev)?;
        let log_std = Tensor::from_slice(&[0.3f32, -0.2, 0.3, -0.2], (2, 2), &dev)?;
        let act = Tensor::from_slice(&[0.5f32, -1.0, 1.5, 0.0], (2, 2), &dev)?;
        let lp = log_prob(&act, &mean, &log_std)?.to_vec1::<f32>()?;

        let c = (2. * std::f32::consts::PI).sqrt().ln();
        let at_mean = -0.3 + 0.2 - 2. * c;
        assert!((lp[0] - at_mean).abs() < 1e-5);
        let off = at_mean - 0.5 * (-0.6f32).exp() - 0.5 * (0.4f32).exp();
        assert!((lp[1] - off).abs() < 1e-5);

        let h = entropy(&log_std)?.to_vec1::<f32>()?;
        assert!((h[0] - (0.1 + 2. * 1.418_938_5)).abs() < 1e-5);
        Ok(())
    }
}
