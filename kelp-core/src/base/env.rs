//! Environment.
use anyhow::Result;

/// Represents an environment, typically an MDP.
pub trait Env {
    /// Observation of the environment.
    type Obs: Clone;

    /// Action of the environment.
    type Act;

    /// Information returned by [`Env::reset`] and carried in [`Step`].
    type Info;

    /// Resets the environment. `seed` reseeds its random number generator if given.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Self::Info)>;

    /// Performs an environment step.
    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>>
    where
        Self: Sized;
}

/// Outcome of an environment step, `(o_t+1, r_t)` with episode flags.
pub struct Step<E: Env> {
    /// Next observation.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// The episode reached a terminal state.
    pub is_terminated: bool,

    /// The episode was cut off, typically by a time limit.
    pub is_truncated: bool,

    /// Information defined by the environment.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
