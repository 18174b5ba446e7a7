//! Circular replay buffer.
use super::{TransitionBatch, TransitionRef, TransitionStoreConfig};
use crate::{error::KelpError, Rows};
use log::debug;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// Draws `size` distinct indices uniformly from `0..available`.
pub(crate) fn sample_indices(
    rng: &mut StdRng,
    available: usize,
    size: usize,
) -> Result<Vec<usize>, KelpError> {
    if size > available {
        return Err(KelpError::InsufficientData {
            requested: size,
            available,
        });
    }
    Ok(index::sample(rng, available, size).into_vec())
}

/// A fixed-capacity circular buffer of transitions.
///
/// `A` is the element type of actions, `f32` for continuous actions and `i64`
/// for discrete action indices.
pub struct TransitionStore<A = f32> {
    capacity: usize,
    batch_size: usize,
    n: usize,
    obs: Rows<f32>,
    act: Rows<A>,
    next_obs: Rows<f32>,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
    rng: StdRng,
}

impl<A: Copy + Default> TransitionStore<A> {
    /// Builds a zero-filled store.
    pub fn build(config: &TransitionStoreConfig) -> Result<Self, KelpError> {
        config.validate()?;
        let capacity = config.capacity;
        debug!(
            "Build transition store: capacity = {}, batch_size = {}",
            capacity, config.batch_size
        );

        Ok(Self {
            capacity,
            batch_size: config.batch_size,
            n: 0,
            obs: Rows::new(capacity, config.obs_dim),
            act: Rows::new(capacity, config.act_dim),
            next_obs: Rows::new(capacity, config.obs_dim),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Writes a transition at `n mod capacity` and increments `n`.
    ///
    /// Fails with [`KelpError::DimensionMismatch`] without writing anything if a
    /// row has the wrong width.
    pub fn store(
        &mut self,
        obs: &[f32],
        act: &[A],
        reward: f32,
        next_obs: &[f32],
        is_terminated: bool,
        is_truncated: bool,
    ) -> Result<(), KelpError> {
        self.obs.check("obs", obs)?;
        self.act.check("act", act)?;
        self.next_obs.check("next_obs", next_obs)?;

        let i = self.n % self.capacity;
        self.obs.push(i, obs);
        self.act.push(i, act);
        self.next_obs.push(i, next_obs);
        self.reward[i] = reward;
        self.is_terminated[i] = is_terminated as i8;
        self.is_truncated[i] = is_truncated as i8;
        self.n += 1;

        Ok(())
    }

    /// Samples `batch_size` distinct transitions uniformly at random.
    pub fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch<A>, KelpError> {
        let available = self.len();
        let ixs = sample_indices(&mut self.rng, available, batch_size)?;

        Ok(TransitionBatch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: ixs.iter().map(|&ix| self.reward[ix]).collect(),
            is_terminated: ixs.iter().map(|&ix| self.is_terminated[ix]).collect(),
            is_truncated: ixs.iter().map(|&ix| self.is_truncated[ix]).collect(),
            ix_sample: ixs,
        })
    }

    /// Samples a batch of the configured size.
    pub fn batch(&mut self) -> Result<TransitionBatch<A>, KelpError> {
        self.sample(self.batch_size)
    }

    /// Returns the transition at logical index `i`, counted from the oldest
    /// transition in the store.
    pub fn get(&self, i: usize) -> Option<TransitionRef<'_, A>> {
        if i >= self.len() {
            return None;
        }
        let ix = if self.n > self.capacity {
            (self.n + i) % self.capacity
        } else {
            i
        };

        Some(TransitionRef {
            obs: self.obs.row(ix),
            act: self.act.row(ix),
            reward: self.reward[ix],
            next_obs: self.next_obs.row(ix),
            is_terminated: self.is_terminated[ix] == 1,
            is_truncated: self.is_truncated[ix] == 1,
        })
    }
}

impl<A> TransitionStore<A> {
    /// Returns `true` if at least `batch_size` transitions have been written.
    pub fn ready(&self) -> bool {
        self.n >= self.batch_size
    }

    /// The number of valid transitions, `min(n, capacity)`.
    pub fn len(&self) -> usize {
        self.n.min(self.capacity)
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Capacity of the store.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The write counter, the total number of stored transitions.
    pub fn n_stored(&self) -> usize {
        self.n
    }
}
