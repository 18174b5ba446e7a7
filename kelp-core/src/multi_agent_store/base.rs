//! Multi-agent replay buffer.
use super::{MultiAgentBatch, MultiAgentStoreConfig};
use crate::{error::KelpError, transition_store::sample_indices, Rows};
use log::debug;
use rand::{rngs::StdRng, SeedableRng};

/// Replay buffer holding centralized and per-agent views of each step.
pub struct MultiAgentStore {
    capacity: usize,
    batch_size: usize,
    n_agents: usize,
    n: usize,
    state: Rows<f32>,
    next_state: Rows<f32>,
    reward: Rows<f32>,
    is_terminated: Rows<i8>,
    actor_obs: Vec<Rows<f32>>,
    actor_next_obs: Vec<Rows<f32>>,
    actor_act: Vec<Rows<f32>>,
    rng: StdRng,
}

fn check_len(field: &str, expected: usize, actual: usize) -> Result<(), KelpError> {
    if expected != actual {
        return Err(KelpError::mismatch(field, expected, actual));
    }
    Ok(())
}

fn check_per_agent<V: AsRef<[f32]>>(
    field: &str,
    columns: &[Rows<f32>],
    rows: &[V],
) -> Result<(), KelpError> {
    check_len(field, columns.len(), rows.len())?;
    for (k, (column, row)) in columns.iter().zip(rows).enumerate() {
        column.check(&format!("{}[{}]", field, k), row.as_ref())?;
    }
    Ok(())
}

impl MultiAgentStore {
    /// Builds a zero-filled store.
    pub fn build(config: &MultiAgentStoreConfig) -> Result<Self, KelpError> {
        config.validate()?;
        let capacity = config.capacity;
        let n_agents = config.n_agents();
        let per_agent = |dims: &[usize]| -> Vec<Rows<f32>> {
            dims.iter().map(|&d| Rows::new(capacity, d)).collect()
        };
        debug!(
            "Build multi-agent store: capacity = {}, n_agents = {}",
            capacity, n_agents
        );

        Ok(Self {
            capacity,
            batch_size: config.batch_size,
            n_agents,
            n: 0,
            state: Rows::new(capacity, config.critic_dim),
            next_state: Rows::new(capacity, config.critic_dim),
            reward: Rows::new(capacity, n_agents),
            is_terminated: Rows::new(capacity, n_agents),
            actor_obs: per_agent(&config.actor_dims),
            actor_next_obs: per_agent(&config.actor_dims),
            actor_act: per_agent(&config.n_actions),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Stores one environment step for all agents.
    ///
    /// Every argument is validated before the first write, so the step is either
    /// written to all centralized and per-agent columns at the same index or not
    /// written at all.
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
    ) -> Result<(), KelpError> {
        check_per_agent("raw_obs", &self.actor_obs, raw_obs)?;
        check_per_agent("action", &self.actor_act, action)?;
        check_per_agent("next_raw_obs", &self.actor_next_obs, next_raw_obs)?;
        self.state.check("state", state)?;
        self.next_state.check("next_state", next_state)?;
        check_len("reward", self.n_agents, reward.len())?;
        check_len("done", self.n_agents, done.len())?;

        let i = self.n % self.capacity;
        for k in 0..self.n_agents {
            self.actor_obs[k].push(i, raw_obs[k].as_ref());
            self.actor_act[k].push(i, action[k].as_ref());
            self.actor_next_obs[k].push(i, next_raw_obs[k].as_ref());
        }
        self.state.push(i, state);
        self.next_state.push(i, next_state);
        self.reward.push(i, reward);
        let done = done.iter().map(|&d| d as i8).collect::<Vec<_>>();
        self.is_terminated.push(i, &done);
        self.n += 1;

        Ok(())
    }

    /// Samples `batch_size` distinct steps uniformly at random.
    pub fn sample_buffer(&mut self) -> Result<MultiAgentBatch, KelpError> {
        let available = self.len();
        let ixs = sample_indices(&mut self.rng, available, self.batch_size)?;
        let gather = |columns: &[Rows<f32>]| -> Vec<Rows<f32>> {
            columns.iter().map(|c| c.sample(&ixs)).collect()
        };

        Ok(MultiAgentBatch {
            actor_obs: gather(&self.actor_obs),
            state: self.state.sample(&ixs),
            actions: gather(&self.actor_act),
            reward: self.reward.sample(&ixs),
            actor_next_obs: gather(&self.actor_next_obs),
            next_state: self.next_state.sample(&ixs),
            is_terminated: self.is_terminated.sample(&ixs),
            ix_sample: ixs,
        })
    }

    /// Returns `true` if at least `batch_size` steps have been written.
    pub fn ready(&self) -> bool {
        self.n >= self.batch_size
    }

    /// The number of valid steps.
    pub fn len(&self) -> usize {
        self.n.min(self.capacity)
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// The write counter.
    pub fn n_stored(&self) -> usize {
        self.n
    }

    /// The number of agents.
    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ACTOR_DIMS: [usize; 3] = [2, 3, 1];
    const N_ACTIONS: [usize; 3] = [1, 2, 2];

    fn build(capacity: usize, batch_size: usize) -> MultiAgentStore {
        let config = MultiAgentStoreConfig::default()
            .capacity(capacity)
            .batch_size(batch_size)
            .critic_dim(ACTOR_DIMS.iter().sum())
            .actor_dims(ACTOR_DIMS.to_vec())
            .n_actions(N_ACTIONS.to_vec());
        MultiAgentStore::build(&config).unwrap()
    }

    /// Fills every field of step `t` with values derived from `t`.
    fn push_step(store: &mut MultiAgentStore, t: usize) -> Result<(), KelpError> {
        let m = t as f32;
        let obs: Vec<Vec<f32>> = ACTOR_DIMS.iter().map(|&d| vec![m; d]).collect();
        let next_obs: Vec<Vec<f32>> = ACTOR_DIMS.iter().map(|&d| vec![m + 0.5; d]).collect();
        let act: Vec<Vec<f32>> = N_ACTIONS
            .iter()
            .enumerate()
            .map(|(k, &d)| vec![m * 100. + k as f32; d])
            .collect();
        let state = obs.concat();
        let next_state = next_obs.concat();
        let reward = vec![m; ACTOR_DIMS.len()];
        let done = vec![t % 2 == 0; ACTOR_DIMS.len()];
        store.store_transition(&obs, &state, &act, &reward, &next_obs, &next_state, &done)
    }

    #[test]
    fn test_atomicity() {
        let mut store = build(8, 6);
        (0..13).for_each(|t| push_step(&mut store, t).unwrap());
        assert!(store.ready());

        for _ in 0..10 {
            let batch = store.sample_buffer().unwrap();
            assert_eq!(batch.len(), 6);
            assert_eq!(batch.n_agents(), 3);

            for k in 0..batch.len() {
                let m = batch.reward.row(k)[0];
                assert!(m >= 5.0 && m <= 12.0);
                assert!(batch.reward.row(k).iter().all(|&r| r == m));
                assert!(batch.state.row(k).iter().all(|&s| s == m));
                assert!(batch.next_state.row(k).iter().all(|&s| s == m + 0.5));
                let done = (m as usize % 2 == 0) as i8;
                assert!(batch.is_terminated.row(k).iter().all(|&d| d == done));
                for a in 0..3 {
                    assert!(batch.actor_obs[a].row(k).iter().all(|&o| o == m));
                    assert!(batch.actor_next_obs[a].row(k).iter().all(|&o| o == m + 0.5));
                    let marker = m * 100. + a as f32;
                    assert!(batch.actions[a].row(k).iter().all(|&x| x == marker));
                }
            }
        }
    }

    #[test]
    fn test_ready_and_insufficient_data() {
        let mut store = build(8, 4);
        (0..3).for_each(|t| push_step(&mut store, t).unwrap());
        assert!(!store.ready());
        assert_eq!(
            store.sample_buffer().err(),
            Some(KelpError::InsufficientData {
                requested: 4,
                available: 3
            })
        );
        push_step(&mut store, 3).unwrap();
        assert!(store.ready());
        assert_eq!(store.sample_buffer().unwrap().len(), 4);
    }

    #[test]
    fn test_rejects_malformed_input() {
        let mut store = build(8, 1);
        push_step(&mut store, 0).unwrap();

        let obs: Vec<Vec<f32>> = ACTOR_DIMS.iter().map(|&d| vec![1.; d]).collect();
        let act: Vec<Vec<f32>> = N_ACTIONS.iter().map(|&d| vec![1.; d]).collect();
        let state = vec![1.; 6];
        let reward = vec![1.; 3];
        let done = vec![false; 3];

        // Missing an agent in the action list.
        let res = store.store_transition(&obs, &state, &act[..2], &reward, &obs, &state, &done);
        assert_eq!(res, Err(KelpError::mismatch("action", 3, 2)));

        // Wrong feature width of agent 1's observation.
        let mut bad_obs = obs.clone();
        bad_obs[1] = vec![1.; 2];
        let res = store.store_transition(&bad_obs, &state, &act, &reward, &obs, &state, &done);
        assert_eq!(res, Err(KelpError::mismatch("raw_obs[1]", 3, 2)));

        // Wrong joint state width.
        let res = store.store_transition(&obs, &state[..5], &act, &reward, &obs, &state, &done);
        assert_eq!(res, Err(KelpError::mismatch("state", 6, 5)));

        // Wrong number of terminal flags.
        let res = store.store_transition(&obs, &state, &act, &reward, &obs, &state, &done[..1]);
        assert_eq!(res, Err(KelpError::mismatch("done", 3, 1)));

        assert_eq!(store.n_stored(), 1);
        let batch = store.sample_buffer().unwrap();
        assert_eq!(batch.reward.row(0), &[0., 0., 0.]);
    }
}
