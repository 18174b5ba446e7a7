//! MADDPG agent implemented with candle.
use super::config::MaddpgConfig;
use crate::{
    model::{Model1, Model2, SubModel1, SubModel2},
    util::{not_done, obs_to_tensor, rows_to_tensor, td_target, track},
};
use anyhow::{anyhow, Result};
use candle_core::{shape::D, Device, Tensor};
use candle_nn::loss::mse;
use kelp_core::{
    error::KelpError,
    record::{Record, RecordValue},
    Agent, MultiAgentStore, Rows,
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

/// Multi-agent DDPG.
///
/// Actor `i` acts on agent `i`'s local observation. Critic `i` evaluates the joint
/// state together with the actions of all agents, concatenated in agent order.
pub struct Maddpg<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    actors: Vec<Model1<P>>,
    target_actors: Vec<Model1<P>>,
    critics: Vec<Model2<Q>>,
    target_critics: Vec<Model2<Q>>,
    store: MultiAgentStore,
    gamma: f64,
    tau: f64,
    max_action: f64,
    noise: Normal<f32>,
    train: bool,
    device: Device,
    rng: SmallRng,
}

/// Column `i` of per-agent terminal flags.
fn column(flags: &Rows<i8>, i: usize) -> Vec<i8> {
    (0..flags.len()).map(|k| flags.row(k)[i]).collect()
}

impl<P, Q> Maddpg<P, Q>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs MADDPG agent.
    ///
    /// Fails if the number of actor or critic configurations differs from the
    /// number of agents of the store.
    pub fn build(config: MaddpgConfig<P::Config, Q::Config>) -> Result<Self> {
        config.validate()?;
        let device = Device::try_from(config.device)?;
        let store = MultiAgentStore::build(&config.store_config)?;

        let mut actors = vec![];
        let mut target_actors = vec![];
        for actor_config in config.actor_configs {
            let actor = Model1::build(actor_config, device.clone())?;
            target_actors.push(actor.target()?);
            actors.push(actor);
        }

        let mut critics = vec![];
        let mut target_critics = vec![];
        for critic_config in config.critic_configs {
            let critic = Model2::build(critic_config, device.clone())?;
            target_critics.push(critic.target()?);
            critics.push(critic);
        }

        let noise = Normal::new(0f32, (config.noise * config.max_action) as f32)
            .map_err(|e| anyhow!("Invalid exploration noise: {}", e))?;

        Ok(Self {
            actors,
            target_actors,
            critics,
            target_critics,
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

    /// The number of agents.
    pub fn n_agents(&self) -> usize {
        self.actors.len()
    }

    fn act(actor: &Model1<P>, obs: &Tensor, max_action: f64) -> Result<Tensor> {
        Ok(actor.forward(obs)?.affine(max_action, 0.)?)
    }

    /// Selects one action per agent from the agents' local observations.
    ///
    /// Noise is added in training mode. Actions are clipped to
    /// `[-max_action, max_action]`.
    pub fn choose_action<V: AsRef<[f32]>>(&mut self, raw_obs: &[V]) -> Result<Vec<Vec<f32>>> {
        if raw_obs.len() != self.n_agents() {
            return Err(KelpError::DimensionMismatch {
                field: "raw_obs".into(),
                expected: self.n_agents(),
                actual: raw_obs.len(),
            }
            .into());
        }

        let max = self.max_action as f32;
        let (train, noise, rng) = (self.train, &self.noise, &mut self.rng);
        let mut actions = Vec::with_capacity(raw_obs.len());
        for (actor, obs) in self.actors.iter().zip(raw_obs) {
            let obs = obs_to_tensor(obs.as_ref(), &self.device)?;
            let act = Self::act(actor, &obs, self.max_action)?
                .squeeze(0)?
                .to_vec1::<f32>()?;
            let act = act
                .into_iter()
                .map(|a| {
                    let a = if train {
                        a + noise.sample(&mut *rng)
                    } else {
                        a
                    };
                    a.clamp(-max, max)
                })
                .collect();
            actions.push(act);
        }

        Ok(actions)
    }

    /// Stores one environment step for all agents.
    #[allow(clippy::too_many_arguments)]
    pub fn store_transition<V: AsRef<[f32]>>(
        &mut self,
        raw_obs: &[V],
        state: &[f32],
        action: &[V],
        reward: &[f32],
        next_raw_obs: &[V],
        next_state: &[f32],
        done: &[bool],
    ) -> Result<()> {
        self.store.store_transition(
            raw_obs,
            state,
            action,
            reward,
            next_raw_obs,
            next_state,
            done,
        )?;
        Ok(())
    }

    /// The replay buffer.
    pub fn store(&self) -> &MultiAgentStore {
        &self.store
    }

    fn update(&mut self) -> Result<Vec<(f32, f32)>> {
        let batch = self.store.sample_buffer()?;
        let batch_size = batch.len();
        let to_tensors = |columns: &[Rows<f32>]| -> Result<Vec<Tensor>> {
            columns
                .iter()
                .map(|c| rows_to_tensor(c, &self.device))
                .collect()
        };
        let actor_obs = to_tensors(&batch.actor_obs)?;
        let actor_next_obs = to_tensors(&batch.actor_next_obs)?;
        let actions = to_tensors(&batch.actions)?;
        let state = rows_to_tensor(&batch.state, &self.device)?;
        let next_state = rows_to_tensor(&batch.next_state, &self.device)?;
        let reward = rows_to_tensor(&batch.reward, &self.device)?;

        let joint_act = Tensor::cat(&actions, D::Minus1)?;
        let next_joint_act = {
            let next_acts = self
                .target_actors
                .iter()
                .zip(actor_next_obs.iter())
                .map(|(actor, obs)| Self::act(actor, obs, self.max_action))
                .collect::<Result<Vec<_>>>()?;
            Tensor::cat(&next_acts, D::Minus1)?
        };

        let mut losses = Vec::with_capacity(self.n_agents());
        for i in 0..self.n_agents() {
            trace!("Critic loss of agent {}", i);
            let loss_critic = {
                let reward = reward.narrow(1, i, 1)?.squeeze(1)?;
                let not_done = not_done(&column(&batch.is_terminated, i), &self.device)?;
                let q_next = self.target_critics[i]
                    .forward(&next_state, &next_joint_act)?
                    .squeeze(D::Minus1)?;
                let tgt = td_target(&reward, &not_done, &q_next, self.gamma)?;
                let pred = self.critics[i]
                    .forward(&state, &joint_act)?
                    .squeeze(D::Minus1)?;
                debug_assert_eq!(pred.dims(), [batch_size]);
                mse(&pred, &tgt)?
            };
            self.critics[i].backward_step(&loss_critic)?;

            trace!("Actor loss of agent {}", i);
            let loss_actor = {
                let mut acts = actions.clone();
                acts[i] = Self::act(&self.actors[i], &actor_obs[i], self.max_action)?;
                let joint_act = Tensor::cat(&acts, D::Minus1)?;
                self.critics[i]
                    .forward(&state, &joint_act)?
                    .mean_all()?
                    .neg()?
            };
            self.actors[i].backward_step(&loss_actor)?;

            losses.push((
                loss_critic.to_scalar::<f32>()?,
                loss_actor.to_scalar::<f32>()?,
            ));
        }

        Ok(losses)
    }

    fn soft_update(&self) -> Result<()> {
        for (tgt, src) in self.target_critics.iter().zip(self.critics.iter()) {
            track(tgt.varmap(), src.varmap(), self.tau)?;
        }
        for (tgt, src) in self.target_actors.iter().zip(self.actors.iter()) {
            track(tgt.varmap(), src.varmap(), self.tau)?;
        }
        Ok(())
    }

    fn param_names(i: usize) -> [String; 4] {
        [
            format!("agent_{}_actor_maddpg", i),
            format!("agent_{}_target_actor_maddpg", i),
            format!("agent_{}_critic_maddpg", i),
            format!("agent_{}_target_critic_maddpg", i),
        ]
    }
}

impl<P, Q> Agent for Maddpg<P, Q>
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

        let losses = self.update()?;
        self.soft_update()?;

        let mut record = Record::empty();
        for (i, (loss_critic, loss_actor)) in losses.into_iter().enumerate() {
            record.insert(format!("loss_critic_{}", i), RecordValue::Scalar(loss_critic));
            record.insert(format!("loss_actor_{}", i), RecordValue::Scalar(loss_actor));
        }
        Ok(Some(record))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(path)?;
        let mut paths = vec![];
        for i in 0..self.n_agents() {
            let [actor, target_actor, critic, target_critic] = Self::param_names(i);
            let [actor, target_actor, critic, target_critic] = [
                path.join(actor),
                path.join(target_actor),
                path.join(critic),
                path.join(target_critic),
            ];
            self.actors[i].save(&actor)?;
            self.target_actors[i].save(&target_actor)?;
            self.critics[i].save(&critic)?;
            self.target_critics[i].save(&target_critic)?;
            paths.extend(vec![actor, target_actor, critic, target_critic]);
        }
        info!("Save MADDPG agent to {:?}", path);
        Ok(paths)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        for i in 0..self.n_agents() {
            let [actor, target_actor, critic, target_critic] = Self::param_names(i);
            self.actors[i].load(path.join(actor))?;
            self.target_actors[i].load(path.join(target_actor))?;
            self.critics[i].load(path.join(critic))?;
            self.target_critics[i].load(path.join(target_critic))?;
        }
        Ok(())
    }
}
