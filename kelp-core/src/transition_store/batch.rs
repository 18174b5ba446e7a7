//! Batches and views of [`TransitionStore`](super::TransitionStore).
use crate::Rows;

/// A transition borrowed from a store.
#[derive(Debug, PartialEq)]
pub struct TransitionRef<'a, A> {
    /// Observation.
    pub obs: &'a [f32],

    /// Action.
    pub act: &'a [A],

    /// Reward.
    pub reward: f32,

    /// Next observation.
    pub next_obs: &'a [f32],

    /// Flag denoting if the episode terminated at this transition.
    pub is_terminated: bool,

    /// Flag denoting if the episode was truncated at this transition.
    pub is_truncated: bool,
}

/// Transitions gathered at sampled indices. Row `k` of every field describes the
/// same transition.
#[derive(Debug, Clone)]
pub struct TransitionBatch<A> {
    /// Observations.
    pub obs: Rows<f32>,

    /// Actions.
    pub act: Rows<A>,

    /// Next observations.
    pub next_obs: Rows<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Termination flags, 1 if terminated.
    pub is_terminated: Vec<i8>,

    /// Truncation flags, 1 if truncated.
    pub is_truncated: Vec<i8>,

    /// Physical indices of the sampled transitions in the store.
    pub ix_sample: Vec<usize>,
}

impl<A> TransitionBatch<A> {
    /// Batch size.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Unpacks the batch into its fields.
    #[allow(clippy::type_complexity)]
    pub fn unpack(
        self,
    ) -> (
        Rows<f32>,
        Rows<A>,
        Rows<f32>,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
        Vec<usize>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
            self.is_truncated,
            self.ix_sample,
        )
    }
}
