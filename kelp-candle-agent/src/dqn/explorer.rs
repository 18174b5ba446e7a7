//! Exploration strategy of DQN.
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer with linear decay.
///
/// Epsilon starts at `eps_start` and decreases by `eps_dec` after every action
/// selection until it reaches `eps_min`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Current epsilon.
    pub eps: f64,

    /// Decrement per action selection.
    pub eps_dec: f64,

    /// Floor of epsilon.
    pub eps_min: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps: 1.0,
            eps_dec: 1e-5,
            eps_min: 0.1,
        }
    }
}

impl EpsilonGreedy {
    /// Sets the initial epsilon.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps = v;
        self
    }

    /// Sets the decrement.
    pub fn eps_dec(mut self, v: f64) -> Self {
        self.eps_dec = v;
        self
    }

    /// Sets the floor.
    pub fn eps_min(mut self, v: f64) -> Self {
        self.eps_min = v;
        self
    }

    /// Returns an action given the greedy one, then decays epsilon.
    ///
    /// With probability `eps` the action is drawn uniformly from `0..n_actions`.
    pub fn action(&mut self, greedy: i64, n_actions: i64, rng: &mut impl Rng) -> i64 {
        let act = if rng.gen::<f64>() < self.eps {
            rng.gen_range(0..n_actions)
        } else {
            greedy
        };
        self.eps = (self.eps - self.eps_dec).max(self.eps_min);
        act
    }
}
