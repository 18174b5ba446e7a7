//! DDPG agent implemented with candle.
use super::config::DdpgConfig;
use crate::{
    model::{Model1, Model2, SubModel1, SubModel2},
    util::{not_done, obs_to_tensor, rows_to_tensor, td_target, track},
};
use anyhow::{anyhow, Result};
use candle_core::{shape::D, Device, Tensor};
use candle_nn::loss::mse;
use kelp_core::{
    record::{Record, RecordValue},
    Agent, TransitionStore,
};
use log::{info, trace};
use rand::{rngs::SmallRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    convert::TryFrom,
    fs,
    path::{Path, PathBuf},
};

/// Deterministic actor-critic agent.
///
/// The actor is expected to output values in `[-1, 1]` (tanh), which are scaled by
/// `max_action`.
pub struct Ddpg<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    actor: Model1<P>,
    target_actor: Model1<P>,
    critic: Model2<Q>,
    target_critic: Model2<Q>,
    store: TransitionStore<f32>,
    gamma: f64,
    tau: f64,
    max_action: f64,
    noise: Normal<f32>,
    train: bool,
    device: Device,
    rng: SmallRng,
}

impl<P, Q> Ddpg<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs DDPG agent. Target networks start as copies of the online ones.
    pub fn build(config: DdpgConfig<P::Config, Q::Config>) -> Result<Self> {
        let device = Device::try_from(config.device)?;
        let actor = Model1::build(config.actor_config, device.clone())?;
        let target_actor = actor.target()?;
        let critic = Model2::build(config.critic_config, device.clone())?;
        let target_critic = critic.target()?;
        let store = TransitionStore::build(&config.store_config)?;
        let noise = Normal::new(0f32, (config.noise * config.max_action) as f32)
            .map_err(|e| anyhow!("Invalid exploration noise: {}", e))?;

        Ok(Self {
            actor,
            target_actor,
            critic,
            target_critic,
            store,
            gamma: config.gamma,
            tau: config.tau,
            max_action: config.max_action,
            noise,
            train: true,
            device,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    fn act(actor: &Model1<P>, obs: &Tensor, max_action: f64) -> Result<Tensor> {
        Ok(actor.forward(obs)?.affine(max_action, 0.)?)
    }

    /// Selects an action for a single observation.
    ///
    /// In training mode Gaussian noise is added. The result is clipped to
    /// `[-max_action, max_action]`.
    pub fn choose_action(&mut self, obs: &[f32]) -> Result<Vec<f32>> {
        let obs = obs_to_tensor(obs, &self.device)?;
        let act = Self::act(&self.actor, &obs, self.max_action)?
            .squeeze(0)?
            .to_vec1::<f32>()?;
        let max = self.max_action as f32;

        Ok(act
            .into_iter()
            .map(|a| {
                let a = if self.train {
                    a + self.noise.sample(&mut self.rng)
                } else {
                    a
                };
                a.clamp(-max, max)
            })
            .collect())
    }

    /// Stores a transition in the replay buffer.
    pub fn store_transition(
        &mut self,
        obs: &[f32],
        act: &[f32],
        reward: f32,
        next_obs: &[f32],
        is_terminated: bool,
        is_truncated: bool,
    ) -> Result<()> {
        self.store
            .store(obs, act, reward, next_obs, is_terminated, is_truncated)?;
        Ok(())
    }

    /// The replay buffer.
    pub fn store(&self) -> &TransitionStore<f32> {
        &self.store
    }

    fn update(&mut self) -> Result<(f32, f32)> {
        let batch = self.store.batch()?;
        let (obs, act, next_obs, reward, is_terminated, _, _) = batch.unpack();
        let batch_size = reward.len();
        let obs = rows_to_tensor(&obs, &self.device)?;
        let act = rows_to_tensor(&act, &self.device)?;
        let next_obs = rows_to_tensor(&next_obs, &self.device)?;
        let reward = Tensor::from_vec(reward, (batch_size,), &self.device)?;
        let not_done = not_done(&is_terminated, &self.device)?;

        trace!("Critic loss");
        let loss_critic = {
            let tgt = {
                let next_act = Self::act(&self.target_actor, &next_obs, self.max_action)?;
                let q_next = self
                    .target_critic
                    .forward(&next_obs, &next_act)?
                    .squeeze(D::Minus1)?;
                td_target(&reward, &not_done, &q_next, self.gamma)?
            };
            let pred = self.critic.forward(&obs, &act)?.squeeze(D::Minus1)?;
            debug_assert_eq!(pred.dims(), [batch_size]);
            mse(&pred, &tgt)?
        };
        self.critic.backward_step(&loss_critic)?;

        trace!("Actor loss");
        let loss_actor = {
            let act = Self::act(&self.actor, &obs, self.max_action)?;
            self.critic.forward(&obs, &act)?.mean_all()?.neg()?
        };
        self.actor.backward_step(&loss_actor)?;

        Ok((
            loss_critic.to_scalar::<f32>()?,
            loss_actor.to_scalar::<f32>()?,
        ))
    }
}

impl<P, Q> Agent for Ddpg<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
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

    fn learn(&mut self) -> Result<Option<Record>> {
        if !self.store.ready() {
            return Ok(None);
        }

        let (loss_critic, loss_actor) = self.update()?;
        track(self.target_critic.varmap(), self.critic.varmap(), self.tau)?;
        track(self.target_actor.varmap(), self.actor.varmap(), self.tau)?;

        Ok(Some(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("loss_actor", RecordValue::Scalar(loss_actor)),
        ])))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(path)?;
        let paths = [
            "actor_ddpg",
            "target_actor_ddpg",
            "critic_ddpg",
            "target_critic_ddpg",
        ]
        .iter()
        .map(|name| path.join(name))
        .collect::<Vec<_>>();

        self.actor.save(&paths[0])?;
        self.target_actor.save(&paths[1])?;
        self.critic.save(&paths[2])?;
        self.target_critic.save(&paths[3])?;
        info!("Save DDPG agent to {:?}", path);
        Ok(paths)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(path.join("actor_ddpg"))?;
        self.target_actor.load(path.join("target_actor_ddpg"))?;
        self.critic.load(path.join("critic_ddpg"))?;
        self.target_critic.load(path.join("target_critic_ddpg"))?;
        Ok(())
    }
}
