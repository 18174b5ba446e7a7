use crate::Rows;

/// Rollout steps gathered at a minibatch of indices.
#[derive(Debug, Clone)]
pub struct TrajectoryBatch {
    /// Observations.
    pub obs: Rows<f32>,

    /// Actions.
    pub act: Rows<f32>,

    /// Log probabilities of the actions under the behavior policy.
    pub log_prob: Vec<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Next observations.
    pub next_obs: Rows<f32>,

    /// Terminal flags, 1 if the episode ended at the step.
    pub is_terminated: Vec<i8>,
}

impl TrajectoryBatch {
    /// Batch size.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
