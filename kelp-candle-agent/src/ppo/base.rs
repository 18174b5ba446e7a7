//! PPO agent implemented with candle.
use super::{
    config::PpoConfig,
    gaussian::{entropy, log_prob},
};
use crate::{
    model::{Model1, SubModel1},
    util::{obs_to_tensor, rows_to_tensor},
};
use anyhow::Result;
use candle_core::{shape::D, Device, Tensor};
use candle_nn::loss::mse;
use kelp_core::{
    record::{Record, RecordValue},
    util::gae,
    Agent, TrajectoryStore,
};
use log::{info, trace};
use rand::{rngs::SmallRng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    convert::TryFrom,
    fs,
    path::{Path, PathBuf},
};

/// PPO agent owning its rollout buffer.
///
/// The policy `P` returns the mean and the log standard deviation of a diagonal
/// Gaussian. The value function `V` returns a tensor of shape `(batch_size, 1)`.
pub struct Ppo<P, V>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
    V::Config: DeserializeOwned + Serialize + Clone,
{
    actor: Model1<P>,
    critic: Model1<V>,
    store: TrajectoryStore,
    gamma: f64,
    gae_lambda: f64,
    policy_clip: f64,
    n_epochs: usize,
    entropy_coefficient: f64,
    train: bool,
    device: Device,
    rng: SmallRng,
}

impl<P, V> Ppo<P, V>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
    V::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs PPO agent.
    pub fn build(config: PpoConfig<P::Config, V::Config>) -> Result<Self> {
        let device = Device::try_from(config.device)?;
        let actor = Model1::build(config.actor_config, device.clone())?;
        let critic = Model1::build(config.critic_config, device.clone())?;
        let store = TrajectoryStore::build(&config.store_config)?;

        Ok(Self {
            actor,
            critic,
            store,
            gamma: config.gamma,
            gae_lambda: config.gae_lambda,
            policy_clip: config.policy_clip,
            n_epochs: config.n_epochs,
            entropy_coefficient: config.entropy_coefficient,
            train: true,
            device,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    /// Selects an action and returns it with its log probability.
    ///
    /// The action is sampled from the policy in training mode and is the mean of
    /// the policy in evaluation mode.
    pub fn choose_action(&mut self, obs: &[f32]) -> Result<(Vec<f32>, f32)> {
        let obs = obs_to_tensor(obs, &self.device)?;
        let (mean, log_std) = self.actor.forward(&obs)?;

        let act = if self.train {
            let std = log_std.exp()?.squeeze(0)?.to_vec1::<f32>()?;
            let mean = mean.squeeze(0)?.to_vec1::<f32>()?;
            let act = mean
                .iter()
                .zip(std.iter())
                .map(|(m, s)| {
                    let z: f32 = StandardNormal.sample(&mut self.rng);
                    m + s * z
                })
                .collect::<Vec<_>>();
            Tensor::from_vec(act, (1, std.len()), &self.device)?
        } else {
            mean.clone()
        };
        let lp = log_prob(&act, &mean, &log_std)?
            .squeeze(0)?
            .to_scalar::<f32>()?;

        Ok((act.squeeze(0)?.to_vec1::<f32>()?, lp))
    }

    /// Appends a step to the rollout buffer.
    pub fn store_memory(
        &mut self,
        obs: &[f32],
        act: &[f32],
        reward: f32,
        next_obs: &[f32],
        is_terminated: bool,
        log_prob: f32,
    ) -> Result<()> {
        self.store
            .store_memory(obs, act, reward, next_obs, is_terminated, log_prob)?;
        Ok(())
    }

    /// The rollout buffer.
    pub fn store(&self) -> &TrajectoryStore {
        &self.store
    }

    fn values(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.critic.forward(obs)?.squeeze(D::Minus1)?)
    }

    /// Advantages and return estimates of every step in the rollout.
    fn advantages(&self) -> Result<(Vec<f32>, Vec<f32>)> {
        let obs = rows_to_tensor(self.store.obs(), &self.device)?;
        let next_obs = rows_to_tensor(self.store.next_obs(), &self.device)?;
        let value = self.values(&obs)?.to_vec1::<f32>()?;
        let next_value = self.values(&next_obs)?.to_vec1::<f32>()?;
        let advantage = gae(
            self.store.reward(),
            &value,
            &next_value,
            self.store.is_terminated(),
            self.gamma as f32,
            self.gae_lambda as f32,
        );
        let returns = advantage
            .iter()
            .zip(value.iter())
            .map(|(a, v)| a + v)
            .collect();
        Ok((advantage, returns))
    }

    fn update(
        &mut self,
        ixs: &[usize],
        advantage: &[f32],
        returns: &[f32],
    ) -> Result<(f32, f32, f32)> {
        let batch = self.store.gather(ixs)?;
        let n = batch.len();
        let obs = rows_to_tensor(&batch.obs, &self.device)?;
        let act = rows_to_tensor(&batch.act, &self.device)?;
        let old_log_prob = Tensor::from_vec(batch.log_prob, (n,), &self.device)?;
        let pick = |xs: &[f32]| ixs.iter().map(|&ix| xs[ix]).collect::<Vec<_>>();
        let advantage = Tensor::from_vec(pick(advantage), (n,), &self.device)?;
        let returns = Tensor::from_vec(pick(returns), (n,), &self.device)?;

        let (loss_actor, entropy) = {
            let (mean, log_std) = self.actor.forward(&obs)?;
            let ratio = (log_prob(&act, &mean, &log_std)? - old_log_prob)?.exp()?;
            let (lo, hi) = (1. - self.policy_clip as f32, 1. + self.policy_clip as f32);
            let surr1 = (&ratio * &advantage)?;
            let surr2 = (ratio.clamp(lo, hi)? * &advantage)?;
            let surrogate = surr1.minimum(&surr2)?.mean_all()?.neg()?;
            let entropy = entropy(&log_std)?.mean_all()?;
            let loss = (surrogate - entropy.affine(self.entropy_coefficient, 0.)?)?;
            (loss, entropy)
        };
        self.actor.backward_step(&loss_actor)?;

        let loss_critic = mse(&self.values(&obs)?, &returns)?;
        self.critic.backward_step(&loss_critic)?;

        Ok((
            loss_actor.to_scalar::<f32>()?,
            loss_critic.to_scalar::<f32>()?,
            entropy.to_scalar::<f32>()?,
        ))
    }
}

impl<P, V> Agent for Ppo<P, V>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
    V::Config: DeserializeOwned + Serialize + Clone,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    /// Runs `n_epochs` passes over the rollout and clears the buffer.
    ///
    /// Returns `Ok(None)` until the buffer holds a full rollout.
    fn learn(&mut self) -> Result<Option<Record>> {
        if !self.store.is_full() {
            return Ok(None);
        }

        let (advantage, returns) = self.advantages()?;
        let (mut loss_actor, mut loss_critic, mut entropy) = (0f32, 0f32, 0f32);
        let mut n_steps = 0;
        for epoch in 0..self.n_epochs {
            trace!("PPO epoch {}", epoch);
            for ixs in self.store.generate_batches()? {
                let (la, lc, h) = self.update(&ixs, &advantage, &returns)?;
                loss_actor += la;
                loss_critic += lc;
                entropy += h;
                n_steps += 1;
            }
        }
        self.store.clear_memory();

        let n = n_steps.max(1) as f32;
        Ok(Some(Record::from_slice(&[
            ("loss_actor", RecordValue::Scalar(loss_actor / n)),
            ("loss_critic", RecordValue::Scalar(loss_critic / n)),
            ("entropy", RecordValue::Scalar(entropy / n)),
        ])))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(path)?;
        let path_actor = path.join("actor_ppo");
        let path_critic = path.join("critic_ppo");
        self.actor.save(&path_actor)?;
        self.critic.save(&path_critic)?;
        info!("Save PPO agent to {:?}", path);
        Ok(vec![path_actor, path_critic])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(path.join("actor_ppo"))?;
        self.critic.load(path.join("critic_ppo"))?;
        Ok(())
    }
}
