use anyhow::Result;
use candle_core::{safetensors, Device, Tensor};
use kelp_candle_agent::{
    dqn::{Dqn, DqnConfig, EpsilonGreedy},
    mlp::{Mlp, MlpConfig},
    model::Model1,
};
use kelp_core::{error::KelpError, Agent};
use std::path::Path;
use tempdir::TempDir;

const OBS_DIM: usize = 4;
const N_ACTIONS: usize = 3;
const BATCH_SIZE: usize = 8;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> DqnConfig<MlpConfig> {
    let config = DqnConfig::mlp(OBS_DIM, N_ACTIONS, vec![16, 16], 1e-3);
    let store_config = config.store_config.clone().capacity(100).batch_size(BATCH_SIZE);
    config.store_config(store_config).replace(2)
}

fn obs(t: usize) -> Vec<f32> {
    (0..OBS_DIM).map(|i| ((t + i) % 7) as f32 * 0.1).collect()
}

fn fill(agent: &mut Dqn<Mlp>, n: usize) -> Result<()> {
    for t in 0..n {
        let reward = if t % 2 == 0 { 1.0 } else { -1.0 };
        agent.store_transition(
            &obs(t),
            (t % N_ACTIONS) as i64,
            reward,
            &obs(t + 1),
            t % 10 == 9,
            false,
        )?;
    }
    Ok(())
}

fn params(path: &Path) -> Result<Vec<(String, Vec<f32>)>> {
    let mut ps = safetensors::load(path, &Device::Cpu)?
        .into_iter()
        .map(|(k, t)| -> Result<_> { Ok((k, t.flatten_all()?.to_vec1::<f32>()?)) })
        .collect::<Result<Vec<_>>>()?;
    ps.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(ps)
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() <= 1e-4 * (1.0 + expected.abs()),
        "{} != {}",
        actual,
        expected
    );
}

/// Q-values of `rows` under the network saved at `path`.
fn q_values(
    config: &DqnConfig<MlpConfig>,
    path: &Path,
    rows: &[Vec<f32>],
) -> Result<Vec<Vec<f32>>> {
    let mut q = Model1::<Mlp>::build(config.model_config.clone(), Device::Cpu)?;
    q.load(path)?;
    let xs = Tensor::from_vec(rows.concat(), (rows.len(), OBS_DIM), &Device::Cpu)?;
    Ok(q.forward(&xs)?.to_vec2::<f32>()?)
}

#[test]
fn test_epsilon_decays_to_floor() -> Result<()> {
    init_logger();
    let explorer = EpsilonGreedy::default()
        .eps_start(1.0)
        .eps_dec(0.1)
        .eps_min(0.25);
    let mut agent = Dqn::<Mlp>::build(config().explorer(explorer))?;

    let mut prev = agent.epsilon();
    for t in 0..30 {
        let a = agent.choose_action(&obs(t))?;
        assert!((0..N_ACTIONS as i64).contains(&a));
        let eps = agent.epsilon();
        assert!(eps <= prev);
        assert!(eps >= 0.25);
        prev = eps;
    }
    assert_eq!(agent.epsilon(), 0.25);

    // No decay in evaluation mode.
    let explorer = EpsilonGreedy::default().eps_start(0.9).eps_dec(0.1);
    let mut agent = Dqn::<Mlp>::build(config().explorer(explorer))?;
    agent.eval();
    agent.choose_action(&obs(0))?;
    assert_eq!(agent.epsilon(), 0.9);
    Ok(())
}

#[test]
fn test_learn_waits_for_batch() -> Result<()> {
    init_logger();
    let mut agent = Dqn::<Mlp>::build(config())?;
    fill(&mut agent, BATCH_SIZE - 1)?;
    assert!(agent.learn()?.is_none());
    assert_eq!(agent.learn_step_counter(), 0);

    fill(&mut agent, 1)?;
    let record = agent.learn()?.expect("store is ready");
    assert!(record.get_scalar("loss_critic")?.is_finite());
    assert!(record.get_scalar("epsilon")?.is_finite());
    assert_eq!(agent.learn_step_counter(), 1);
    Ok(())
}

#[test]
fn test_target_replaced_every_replace_steps() -> Result<()> {
    init_logger();
    let mut agent = Dqn::<Mlp>::build(config())?;
    fill(&mut agent, 32)?;
    let dir = TempDir::new("dqn_replace")?;

    agent.learn()?;
    agent.save_params(dir.path())?;
    let q_eval = params(&dir.path().join("q_eval_dqn"))?;
    let q_next = params(&dir.path().join("q_next_dqn"))?;
    assert_ne!(q_eval, q_next);

    agent.learn()?;
    agent.save_params(dir.path())?;
    let q_eval = params(&dir.path().join("q_eval_dqn"))?;
    let q_next = params(&dir.path().join("q_next_dqn"))?;
    assert_eq!(q_eval, q_next);
    Ok(())
}

#[test]
fn test_save_and_load() -> Result<()> {
    init_logger();
    let mut agent = Dqn::<Mlp>::build(config())?;
    fill(&mut agent, 16)?;
    agent.learn()?;

    let dir = TempDir::new("dqn")?;
    let paths = agent.save_params(&dir.path().join("model_weights"))?;
    assert_eq!(paths.len(), 2);
    assert!(paths.iter().all(|p| p.exists()));
    assert!(paths[0].ends_with("q_eval_dqn"));
    assert!(paths[1].ends_with("q_next_dqn"));

    let mut loaded = Dqn::<Mlp>::build(config())?;
    loaded.load_params(&dir.path().join("model_weights"))?;
    agent.eval();
    loaded.eval();
    for t in 0..10 {
        assert_eq!(agent.choose_action(&obs(t))?, loaded.choose_action(&obs(t))?);
    }
    Ok(())
}

#[test]
fn test_rejects_zero_replace() {
    let err = Dqn::<Mlp>::build(config().replace(0)).err().expect("replace must be positive");
    assert!(matches!(
        err.downcast_ref::<KelpError>(),
        Some(KelpError::InvalidConfig(_))
    ));
}

#[test]
fn test_critic_loss_follows_td_target() -> Result<()> {
    init_logger();
    let gamma = 0.9;
    // The store holds exactly one batch, so every learning step sees all of it.
    let config = {
        let config = config().gamma(gamma).replace(2);
        let store_config = config.store_config.clone().capacity(BATCH_SIZE);
        config.store_config(store_config)
    };
    let mut agent = Dqn::<Mlp>::build(config.clone())?;

    let obs_t = (0..BATCH_SIZE).map(obs).collect::<Vec<_>>();
    let next_obs_t = (1..=BATCH_SIZE).map(obs).collect::<Vec<_>>();
    let act = (0..BATCH_SIZE).map(|t| (t * 2) % N_ACTIONS).collect::<Vec<_>>();
    let reward = (0..BATCH_SIZE).map(|t| t as f32 - 3.0).collect::<Vec<_>>();
    let done = (0..BATCH_SIZE).map(|t| t % 3 == 2).collect::<Vec<_>>();
    for t in 0..BATCH_SIZE {
        agent.store_transition(
            &obs_t[t],
            act[t] as i64,
            reward[t],
            &next_obs_t[t],
            done[t],
            false,
        )?;
    }

    // After one step the online network has moved away from the target network.
    agent.learn()?;
    let dir = TempDir::new("dqn_td")?;
    agent.save_params(dir.path())?;
    let q = q_values(&config, &dir.path().join("q_eval_dqn"), &obs_t)?;
    let q_next = q_values(&config, &dir.path().join("q_next_dqn"), &next_obs_t)?;
    assert_ne!(q, q_values(&config, &dir.path().join("q_next_dqn"), &obs_t)?);

    let expected = (0..BATCH_SIZE)
        .map(|t| {
            let max_next = q_next[t].iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let not_done = if done[t] { 0.0 } else { 1.0 };
            let y = reward[t] + gamma as f32 * not_done * max_next;
            (q[t][act[t]] - y).powi(2)
        })
        .sum::<f32>()
        / BATCH_SIZE as f32;

    let record = agent.learn()?.expect("store is ready");
    assert_close(record.get_scalar("loss_critic")?, expected);
    Ok(())
}
