use super::{create_linear_layers, mlp_forward, MlpConfig};
use crate::model::{SubModel1, SubModel2};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use candle_nn::{Linear, VarBuilder};

/// Multilayer perceptron with ReLU activation function.
///
/// As a [`SubModel2`], the two inputs are concatenated along the last axis, which is
/// how critics take observations and actions.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

fn _build(vb: VarBuilder, config: MlpConfig) -> Result<Mlp> {
    let device = vb.device().clone();
    let layers = create_linear_layers(
        "mlp",
        vb,
        config.in_dim,
        &config.units,
        config.out_dim,
    )?;

    Ok(Mlp {
        config,
        device,
        layers,
    })
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        mlp_forward(xs, &self.layers, &self.config.activation_out)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        _build(vb, config)
    }
}

impl SubModel2 for Mlp {
    type Config = MlpConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Tensor> {
        let input1 = input1.to_device(&self.device)?;
        let input2 = input2.to_device(&self.device)?;
        let input = Tensor::cat(&[input1, input2], D::Minus1)?;
        mlp_forward(input, &self.layers, &self.config.activation_out)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        _build(vb, config)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Activation;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_output_shapes() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(5, vec![8, 8], 1, Activation::None);
        let critic = <Mlp as SubModel2>::build(vb, config)?;

        let obs = Tensor::zeros((4, 3), DType::F32, &Device::Cpu)?;
        let act = Tensor::zeros((4, 2), DType::F32, &Device::Cpu)?;
        let q = SubModel2::forward(&critic, &obs, &act)?;
        assert_eq!(q.dims(), &[4, 1]);
        // Three linear layers, each with a weight and a bias.
        assert_eq!(varmap.all_vars().len(), 6);
        Ok(())
    }

    #[test]
    fn test_tanh_output_is_bounded() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(2, vec![16], 3, Activation::Tanh);
        let actor = <Mlp as SubModel1>::build(vb, config)?;

        let obs = Tensor::from_slice(&[100f32, -100., 50., 20.], (2, 2), &Device::Cpu)?;
        let a = SubModel1::forward(&actor, &obs)?;
        assert_eq!(a.dims(), &[2, 3]);
        assert!(a
            .flatten_all()?
            .to_vec1::<f32>()?
            .iter()
            .all(|x| x.abs() <= 1.0));
        Ok(())
    }
}
