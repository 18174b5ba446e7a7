//! Batch sampled from [`MultiAgentStore`](super::MultiAgentStore).
use crate::Rows;

/// Steps gathered at sampled indices.
///
/// Row `k` of every field, per-agent or centralized, describes the same
/// environment step.
#[derive(Debug, Clone)]
pub struct MultiAgentBatch {
    /// Local observations, one [`Rows`] per agent.
    pub actor_obs: Vec<Rows<f32>>,

    /// Joint states.
    pub state: Rows<f32>,

    /// Actions, one [`Rows`] per agent.
    pub actions: Vec<Rows<f32>>,

    /// Rewards, one column per agent.
    pub reward: Rows<f32>,

    /// Next local observations, one [`Rows`] per agent.
    pub actor_next_obs: Vec<Rows<f32>>,

    /// Next joint states.
    pub next_state: Rows<f32>,

    /// Terminal flags, one column per agent.
    pub is_terminated: Rows<i8>,

    /// Physical indices of the sampled steps.
    pub ix_sample: Vec<usize>,
}

impl MultiAgentBatch {
    /// Batch size.
    pub fn len(&self) -> usize {
        self.ix_sample.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.ix_sample.is_empty()
    }

    /// The number of agents.
    pub fn n_agents(&self) -> usize {
        self.actions.len()
    }
}
