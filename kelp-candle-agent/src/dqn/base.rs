//! DQN agent implemented with candle.
use super::{config::DqnConfig, explorer::EpsilonGreedy};
use crate::{
    model::{Model1, SubModel1},
    util::{not_done, obs_to_tensor, rows_to_tensor, td_target, track, OutDim},
};
use anyhow::Result;
use candle_core::{shape::D, Device, Tensor};
use candle_nn::loss::mse;
use kelp_core::{
    error::KelpError,
    record::{Record, RecordValue},
    Agent, TransitionStore,
};
use log::{info, trace};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    convert::TryFrom,
    fs,
    path::{Path, PathBuf},
};

#[allow(clippy::upper_case_acronyms)]
/// DQN agent owning its replay buffer.
pub struct Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    q_eval: Model1<Q>,
    q_next: Model1<Q>,
    store: TransitionStore<i64>,
    explorer: EpsilonGreedy,
    gamma: f64,
    replace: usize,
    learn_step_counter: usize,
    n_actions: i64,
    train: bool,
    device: Device,
    rng: SmallRng,
}

impl<Q> Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs DQN agent.
    ///
    /// Fails with [`KelpError::InvalidConfig`] if `replace` is zero.
    pub fn build(config: DqnConfig<Q::Config>) -> Result<Self> {
        if config.replace == 0 {
            return Err(KelpError::InvalidConfig("replace must be positive".into()).into());
        }
        let device = Device::try_from(config.device)?;
        let q_eval = Model1::build(config.model_config, device.clone())?;
        let q_next = q_eval.target()?;
        let store = TransitionStore::build(&config.store_config)?;

        Ok(Self {
            q_eval,
            q_next,
            store,
            explorer: config.explorer,
            gamma: config.gamma,
            replace: config.replace,
            learn_step_counter: 0,
            n_actions: config.n_actions as _,
            train: true,
            device,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    /// Selects an action for a single observation.
    ///
    /// In training mode the action is epsilon-greedy and epsilon decays once per
    /// call. In evaluation mode the greedy action is returned.
    pub fn choose_action(&mut self, obs: &[f32]) -> Result<i64> {
        let q = self.q_eval.forward(&obs_to_tensor(obs, &self.device)?)?;
        let greedy = q.argmax(D::Minus1)?.squeeze(0)?.to_scalar::<u32>()? as i64;

        if self.train {
            Ok(self.explorer.action(greedy, self.n_actions, &mut self.rng))
        } else {
            Ok(greedy)
        }
    }

    /// Stores a transition in the replay buffer.
    pub fn store_transition(
        &mut self,
        obs: &[f32],
        act: i64,
        reward: f32,
        next_obs: &[f32],
        is_terminated: bool,
        is_truncated: bool,
    ) -> Result<()> {
        self.store
            .store(obs, &[act], reward, next_obs, is_terminated, is_truncated)?;
        Ok(())
    }

    /// Current epsilon.
    pub fn epsilon(&self) -> f64 {
        self.explorer.eps
    }

    /// The replay buffer.
    pub fn store(&self) -> &TransitionStore<i64> {
        &self.store
    }

    /// The number of learning steps performed.
    pub fn learn_step_counter(&self) -> usize {
        self.learn_step_counter
    }

    fn update_critic(&mut self) -> Result<f32> {
        let batch = self.store.batch()?;
        let (obs, act, next_obs, reward, is_terminated, _, _) = batch.unpack();
        let batch_size = reward.len();
        let obs = rows_to_tensor(&obs, &self.device)?;
        let next_obs = rows_to_tensor(&next_obs, &self.device)?;
        let act = Tensor::from_vec(act.into_vec(), (batch_size, 1), &self.device)?;
        let reward = Tensor::from_vec(reward, (batch_size,), &self.device)?;
        let not_done = not_done(&is_terminated, &self.device)?;

        let pred = self
            .q_eval
            .forward(&obs)?
            .gather(&act, D::Minus1)?
            .squeeze(D::Minus1)?;
        let tgt = {
            let q_next = self.q_next.forward(&next_obs)?.max(D::Minus1)?;
            td_target(&reward, &not_done, &q_next, self.gamma)?
        };
        debug_assert_eq!(pred.dims(), [batch_size]);
        debug_assert_eq!(tgt.dims(), [batch_size]);

        let loss = mse(&pred, &tgt)?;
        self.q_eval.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }
}

impl<Q> Agent for Dqn<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
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

        trace!("update_critic()");
        let loss_critic = self.update_critic()?;

        self.learn_step_counter += 1;
        if self.learn_step_counter % self.replace == 0 {
            track(self.q_next.varmap(), self.q_eval.varmap(), 1.0)?;
            info!(
                "Replace target network at learning step {}",
                self.learn_step_counter
            );
        }

        Ok(Some(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("epsilon", RecordValue::Scalar(self.explorer.eps as f32)),
        ])))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(path)?;
        let path_q_eval = path.join("q_eval_dqn");
        let path_q_next = path.join("q_next_dqn");
        self.q_eval.save(&path_q_eval)?;
        self.q_next.save(&path_q_next)?;
        Ok(vec![path_q_eval, path_q_next])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.q_eval.load(path.join("q_eval_dqn"))?;
        self.q_next.load(path.join("q_next_dqn"))?;
        Ok(())
    }
}
