//! On-policy rollout buffer.
use super::{TrajectoryBatch, TrajectoryStoreConfig};
use crate::{error::KelpError, Rows};
use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// A buffer holding exactly one rollout of `horizon` steps.
pub struct TrajectoryStore {
    horizon: usize,
    num_mini_batch: usize,
    cursor: usize,
    obs: Rows<f32>,
    act: Rows<f32>,
    log_prob: Vec<f32>,
    reward: Vec<f32>,
    next_obs: Rows<f32>,
    is_terminated: Vec<i8>,
    rng: StdRng,
}

impl TrajectoryStore {
    /// Builds a zero-filled store.
    pub fn build(config: &TrajectoryStoreConfig) -> Result<Self, KelpError> {
        config.validate()?;
        let horizon = config.horizon;
        debug!(
            "Build trajectory store: horizon = {}, num_mini_batch = {}",
            horizon, config.num_mini_batch
        );

        Ok(Self {
            horizon,
            num_mini_batch: config.num_mini_batch,
            cursor: 0,
            obs: Rows::new(horizon, config.obs_dim),
            act: Rows::new(horizon, config.act_dim),
            log_prob: vec![0.; horizon],
            reward: vec![0.; horizon],
            next_obs: Rows::new(horizon, config.obs_dim),
            is_terminated: vec![0; horizon],
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Appends a step at the cursor.
    ///
    /// The store has no truncation column, so `is_terminated` is the episode-end
    /// flag: pass `true` for truncated steps as well. Advantages are not carried
    /// across a step flagged here.
    ///
    /// Fails with [`KelpError::BufferOverflow`] when `horizon` steps are already
    /// stored; learning must run and drain the store every `horizon` steps.
    pub fn store_memory(
        &mut self,
        obs: &[f32],
        act: &[f32],
        reward: f32,
        next_obs: &[f32],
        is_terminated: bool,
        log_prob: f32,
    ) -> Result<(), KelpError> {
        if self.cursor == self.horizon {
            return Err(KelpError::BufferOverflow {
                horizon: self.horizon,
            });
        }
        self.obs.check("obs", obs)?;
        self.act.check("act", act)?;
        self.next_obs.check("next_obs", next_obs)?;

        let i = self.cursor;
        self.obs.push(i, obs);
        self.act.push(i, act);
        self.next_obs.push(i, next_obs);
        self.reward[i] = reward;
        self.is_terminated[i] = is_terminated as i8;
        self.log_prob[i] = log_prob;
        self.cursor += 1;

        Ok(())
    }

    /// Returns minibatches of step indices covering the rollout exactly once.
    ///
    /// The indices `0..horizon` are shuffled and the permutation is cut into
    /// contiguous blocks of [`minibatch_size()`](Self::minibatch_size). When the
    /// horizon is not divisible by the block size, the last block is smaller.
    /// Each call reshuffles.
    pub fn generate_batches(&mut self) -> Result<Vec<Vec<usize>>, KelpError> {
        if !self.is_full() {
            return Err(KelpError::InsufficientData {
                requested: self.horizon,
                available: self.cursor,
            });
        }

        let mut ixs = (0..self.horizon).collect::<Vec<_>>();
        ixs.shuffle(&mut self.rng);

        Ok(ixs
            .chunks(self.minibatch_size())
            .map(|chunk| chunk.to_vec())
            .collect())
    }

    /// Size of minibatches, `ceil(horizon / num_mini_batch)`.
    pub fn minibatch_size(&self) -> usize {
        (self.horizon + self.num_mini_batch - 1) / self.num_mini_batch
    }

    /// Gathers the steps at `ixs`.
    ///
    /// Fails with [`KelpError::InsufficientData`] if an index points at or past the
    /// cursor, i.e. at a step not stored yet.
    pub fn gather(&self, ixs: &[usize]) -> Result<TrajectoryBatch, KelpError> {
        if let Some(&ix) = ixs.iter().find(|&&ix| ix >= self.cursor) {
            return Err(KelpError::InsufficientData {
                requested: ix + 1,
                available: self.cursor,
            });
        }

        Ok(TrajectoryBatch {
            obs: self.obs.sample(ixs),
            act: self.act.sample(ixs),
            log_prob: ixs.iter().map(|&ix| self.log_prob[ix]).collect(),
            reward: ixs.iter().map(|&ix| self.reward[ix]).collect(),
            next_obs: self.next_obs.sample(ixs),
            is_terminated: ixs.iter().map(|&ix| self.is_terminated[ix]).collect(),
        })
    }

    /// Zero-fills every column and resets the cursor.
    pub fn clear_memory(&mut self) {
        self.obs.clear();
        self.act.clear();
        self.next_obs.clear();
        self.log_prob.iter_mut().for_each(|x| *x = 0.);
        self.reward.iter_mut().for_each(|x| *x = 0.);
        self.is_terminated.iter_mut().for_each(|x| *x = 0);
        self.cursor = 0;
    }

    /// Returns `true` if `horizon` steps are stored.
    pub fn is_full(&self) -> bool {
        self.cursor == self.horizon
    }

    /// The number of stored steps.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// The horizon `T`.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Observations of all steps.
    pub fn obs(&self) -> &Rows<f32> {
        &self.obs
    }

    /// Actions of all steps.
    pub fn act(&self) -> &Rows<f32> {
        &self.act
    }

    /// Log probabilities of all steps.
    pub fn log_prob(&self) -> &[f32] {
        &self.log_prob
    }

    /// Rewards of all steps.
    pub fn reward(&self) -> &[f32] {
        &self.reward
    }

    /// Next observations of all steps.
    pub fn next_obs(&self) -> &Rows<f32> {
        &self.next_obs
    }

    /// Terminal flags of all steps.
    pub fn is_terminated(&self) -> &[i8] {
        &self.is_terminated
    }
}
