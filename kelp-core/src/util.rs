//! Utilities shared by agents.

/// Computes generalized advantage estimates backward through a rollout.
///
/// With `delta_t = r_t + gamma * V(s_{t+1}) * (1 - done_t) - V(s_t)`, the advantages are
/// `A_t = delta_t + gamma * lambda * (1 - done_t) * A_{t+1}`. A terminal step cuts the
/// recursion, so no value is bootstrapped across episode ends. The last step of the
/// rollout uses its own next-state value and starts the recursion from zero.
///
/// `next_value[t]` is `V(s_{t+1})` evaluated on the stored next observation of step
/// `t`. `is_terminated[t]` must be set on every episode end, truncated ones included;
/// otherwise the advantage of the next episode leaks into step `t`.
pub fn gae(
    reward: &[f32],
    value: &[f32],
    next_value: &[f32],
    is_terminated: &[i8],
    gamma: f32,
    lambda: f32,
) -> Vec<f32> {
    debug_assert_eq!(reward.len(), value.len());
    debug_assert_eq!(reward.len(), next_value.len());
    debug_assert_eq!(reward.len(), is_terminated.len());

    let mut advantage = vec![0f32; reward.len()];
    let mut next_advantage = 0f32;
    for t in (0..reward.len()).rev() {
        let not_done = 1.0 - is_terminated[t] as f32;
        let delta = reward[t] + gamma * next_value[t] * not_done - value[t];
        next_advantage = delta + gamma * lambda * not_done * next_advantage;
        advantage[t] = next_advantage;
    }
    advantage
}

/// Clamps a reward to `[-1, 1]`.
pub fn clip_reward(r: f32) -> f32 {
    r.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gae_terminal_boundary() {
        let reward = [1.0, 2.0, 3.0, 4.0];
        let value = [0.5, 0.4, 0.3, 0.2];
        let next_value = [0.4, 0.3, 9.0, 0.1];
        let done = [0, 0, 1, 0];
        let (gamma, lambda) = (0.9, 0.8);
        let adv = gae(&reward, &value, &next_value, &done, gamma, lambda);

        // At the terminal step the advantage is the TD error without bootstrap.
        assert_eq!(adv[2], reward[2] - value[2]);

        // The step after the boundary does not leak into the terminal step.
        let delta3 = reward[3] + gamma * next_value[3] - value[3];
        assert!((adv[3] - delta3).abs() < 1e-6);

        let delta1 = reward[1] + gamma * next_value[1] - value[1];
        assert!((adv[1] - (delta1 + gamma * lambda * adv[2])).abs() < 1e-6);
        let delta0 = reward[0] + gamma * next_value[0] - value[0];
        assert!((adv[0] - (delta0 + gamma * lambda * adv[1])).abs() < 1e-6);
    }

    #[test]
    fn test_gae_lambda_zero_is_td_error() {
        let reward = [1.0, 0.0, -1.0];
        let value = [0.1, 0.2, 0.3];
        let next_value = [0.2, 0.3, 0.4];
        let adv = gae(&reward, &value, &next_value, &[0, 0, 0], 0.99, 0.0);
        for t in 0..3 {
            let delta = reward[t] + 0.99 * next_value[t] - value[t];
            assert!((adv[t] - delta).abs() < 1e-6);
        }
    }

    #[test]
    fn test_clip_reward() {
        assert_eq!(clip_reward(3.0), 1.0);
        assert_eq!(clip_reward(-0.5), -0.5);
        assert_eq!(clip_reward(-2.0), -1.0);
    }
}
