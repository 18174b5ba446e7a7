use anyhow::Result;
use candle_core::{Device, Tensor, D};
use kelp_candle_agent::{
    mlp::{Mlp, MlpConfig, MlpGaussian},
    model::Model1,
    ppo::{log_prob, Ppo, PpoConfig},
};
use kelp_core::{error::KelpError, util::gae, Agent};
use tempdir::TempDir;

const OBS_DIM: usize = 3;
const ACT_DIM: usize = 2;
const HORIZON: usize = 16;

type PpoMlp = Ppo<MlpGaussian, Mlp>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> PpoConfig<MlpConfig, MlpConfig> {
    let config = PpoConfig::mlp(OBS_DIM, ACT_DIM, vec![16, 16], 1e-3);
    let store_config = config
        .store_config
        .clone()
        .horizon(HORIZON)
        .num_mini_batch(3);
    config.store_config(store_config).n_epochs(2)
}

fn obs(t: usize) -> Vec<f32> {
    let x = (t % 10) as f32 * 0.1;
    vec![x, 1.0 - x, 0.5]
}

fn rollout(agent: &mut PpoMlp, n: usize) -> Result<()> {
    for t in 0..n {
        let (act, log_prob) = agent.choose_action(&obs(t))?;
        let reward = 1.0 - act[0].abs();
        agent.store_memory(&obs(t), &act, reward, &obs(t + 1), t % 10 == 9, log_prob)?;
    }
    Ok(())
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() <= 1e-4 * (1.0 + expected.abs()),
        "{} != {}",
        actual,
        expected
    );
}

#[test]
fn test_choose_action() -> Result<()> {
    init_logger();
    let mut agent = PpoMlp::build(config())?;
    let (act, log_prob) = agent.choose_action(&obs(0))?;
    assert_eq!(act.len(), ACT_DIM);
    assert!(log_prob.is_finite());

    // The policy mean is returned in evaluation mode. The initial log standard
    // deviation is zero, so its log density is that of a standard normal at zero.
    agent.eval();
    let (act1, log_prob) = agent.choose_action(&obs(0))?;
    let (act2, _) = agent.choose_action(&obs(0))?;
    assert_eq!(act1, act2);
    let expected = -(ACT_DIM as f32) * (2. * std::f32::consts::PI).sqrt().ln();
    assert!((log_prob - expected).abs() < 1e-5);
    Ok(())
}

#[test]
fn test_overflow() -> Result<()> {
    init_logger();
    let mut agent = PpoMlp::build(config())?;
    rollout(&mut agent, HORIZON)?;
    assert!(agent.store().is_full());

    let err = agent
        .store_memory(&obs(0), &[0.0, 0.0], 0.0, &obs(1), false, 0.0)
        .expect_err("the rollout is full");
    assert_eq!(
        err.downcast_ref::<KelpError>(),
        Some(&KelpError::BufferOverflow { horizon: HORIZON })
    );
    Ok(())
}

#[test]
fn test_learn_drains_store() -> Result<()> {
    init_logger();
    let mut agent = PpoMlp::build(config())?;
    rollout(&mut agent, HORIZON - 1)?;
    assert!(agent.learn()?.is_none());
    assert_eq!(agent.store().len(), HORIZON - 1);

    rollout(&mut agent, 1)?;
    let record = agent.learn()?.expect("the rollout is full");
    assert!(record.get_scalar("loss_actor")?.is_finite());
    assert!(record.get_scalar("loss_critic")?.is_finite());
    assert!(record.get_scalar("entropy")?.is_finite());
    assert!(agent.store().is_empty());

    // The next rollout can be collected right away.
    rollout(&mut agent, HORIZON)?;
    assert!(agent.learn()?.is_some());
    Ok(())
}

#[test]
fn test_save_and_load() -> Result<()> {
    init_logger();
    let mut agent = PpoMlp::build(config())?;
    rollout(&mut agent, HORIZON)?;
    agent.learn()?;

    let dir = TempDir::new("ppo")?;
    let paths = agent.save_params(dir.path())?;
    assert!(paths[0].ends_with("actor_ppo"));
    assert!(paths[1].ends_with("critic_ppo"));

    let mut loaded = PpoMlp::build(config())?;
    loaded.load_params(dir.path())?;
    agent.eval();
    loaded.eval();
    for t in 0..5 {
        assert_eq!(agent.choose_action(&obs(t))?, loaded.choose_action(&obs(t))?);
    }
    Ok(())
}

#[test]
fn test_clipped_surrogate() -> Result<()> {
    init_logger();
    let (horizon, clip, coef) = (4, 0.2, 0.01);
    let (gamma, lambda) = (0.9, 0.8);
    // One epoch over a single minibatch, so the recorded losses come from one update
    // taken with the saved networks.
    let config = PpoConfig::mlp(OBS_DIM, ACT_DIM, vec![16, 16], 1e-3)
        .n_epochs(1)
        .policy_clip(clip)
        .entropy_coefficient(coef)
        .gamma(gamma)
        .gae_lambda(lambda);
    let store_config = config
        .store_config
        .clone()
        .horizon(horizon)
        .num_mini_batch(1);
    let config = config.store_config(store_config);
    let mut agent = PpoMlp::build(config.clone())?;

    let dir = TempDir::new("ppo_surrogate")?;
    agent.save_params(dir.path())?;
    let mut actor = Model1::<MlpGaussian>::build(config.actor_config.clone(), Device::Cpu)?;
    actor.load(dir.path().join("actor_ppo"))?;
    let mut critic = Model1::<Mlp>::build(config.critic_config.clone(), Device::Cpu)?;
    critic.load(dir.path().join("critic_ppo"))?;

    let obs_t = (0..horizon).flat_map(obs).collect::<Vec<_>>();
    let next_obs_t = (1..=horizon).flat_map(obs).collect::<Vec<_>>();
    let obs_t = Tensor::from_vec(obs_t, (horizon, OBS_DIM), &Device::Cpu)?;
    let next_obs_t = Tensor::from_vec(next_obs_t, (horizon, OBS_DIM), &Device::Cpu)?;
    let (mean, log_std) = actor.forward(&obs_t)?;
    let offset = Tensor::from_slice(
        &[0.3f32, -0.2, -0.5, 0.1, 0.0, 0.4, 0.2, 0.2],
        (horizon, ACT_DIM),
        &Device::Cpu,
    )?;
    let act = (&mean + offset)?;
    let new_log_prob = log_prob(&act, &mean, &log_std)?.to_vec1::<f32>()?;

    // Old log probabilities are set so that the probability ratios are known. The
    // first two fall outside [1 - clip, 1 + clip].
    let ratio = [2.0f32, 0.5, 1.1, 0.9];
    let reward = [1.0f32, -0.5, 0.3, 2.0];
    let done = [false, true, false, false];
    let act = act.to_vec2::<f32>()?;
    for t in 0..horizon {
        let old_log_prob = new_log_prob[t] - ratio[t].ln();
        agent.store_memory(&obs(t), &act[t], reward[t], &obs(t + 1), done[t], old_log_prob)?;
    }

    let value = critic.forward(&obs_t)?.squeeze(D::Minus1)?.to_vec1::<f32>()?;
    let next_value = critic
        .forward(&next_obs_t)?
        .squeeze(D::Minus1)?
        .to_vec1::<f32>()?;
    let is_terminated = done.iter().map(|&d| d as i8).collect::<Vec<_>>();
    let advantage = gae(&reward, &value, &next_value, &is_terminated, gamma as f32, lambda as f32);

    let (lo, hi) = (1.0 - clip as f32, 1.0 + clip as f32);
    let surrogate = (0..horizon)
        .map(|t| {
            let a = advantage[t];
            (ratio[t] * a).min(ratio[t].max(lo).min(hi) * a)
        })
        .sum::<f32>()
        / horizon as f32;
    let entropy = {
        let c = 0.5 * (1.0 + (2.0 * std::f32::consts::PI).ln());
        let log_std = log_std.to_vec2::<f32>()?;
        log_std
            .iter()
            .map(|row| row.iter().map(|s| s + c).sum::<f32>())
            .sum::<f32>()
            / horizon as f32
    };
    // The critic is untouched by the actor step, so its targets differ from its
    // predictions by exactly the advantages.
    let loss_critic = advantage.iter().map(|a| a * a).sum::<f32>() / horizon as f32;

    let record = agent.learn()?.expect("the rollout is full");
    assert_close(record.get_scalar("loss_actor")?, -surrogate - coef as f32 * entropy);
    assert_close(record.get_scalar("entropy")?, entropy);
    assert_close(record.get_scalar("loss_critic")?, loss_critic);
    Ok(())
}
