//! Trust re-scoring applied when a message crosses an encounter.
//!
//! The receiver's policy decides how much of the incoming priority survives,
//! based on how many friends it shares with the sender.

use bevy_ecs::prelude::Resource;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distributions::{sigmoid, Gaussian};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrustPolicy {
    /// Shared friends normalised by a fixed friend ceiling.
    MaxFriends,
    /// Shared friends normalised by the receiver's own friend count.
    FractionOfFriends,
    /// Fraction of friends through a logistic curve plus Gaussian noise.
    #[default]
    SigmoidFractionOfFriends,
    /// Trusts only other adversaries.
    Adversary,
    /// Adversary that also jams honest agents around it.
    AdversaryJammer,
}

impl TrustPolicy {
    pub fn is_adversary(self) -> bool {
        matches!(self, TrustPolicy::Adversary | TrustPolicy::AdversaryJammer)
    }

    pub fn is_jammer(self) -> bool {
        self == TrustPolicy::AdversaryJammer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
pub struct TrustParams {
    /// Friend ceiling used by [TrustPolicy::MaxFriends].
    pub max_friends: u32,
    /// Multiplier floor when sender and receiver share no friends.
    pub epsilon_trust: f64,
    pub sigmoid_cutoff: f64,
    pub sigmoid_rate: f64,
    pub noise_mean: f64,
    pub noise_variance: f64,
}

impl Default for TrustParams {
    fn default() -> Self {
        Self {
            max_friends: 40,
            epsilon_trust: 0.001,
            sigmoid_cutoff: 0.3,
            sigmoid_rate: 13.0,
            noise_mean: 0.0,
            noise_variance: 0.1,
        }
    }
}

/// Inputs to one trust evaluation.
#[derive(Debug, Clone, Copy)]
pub struct TrustInput {
    pub priority: f64,
    pub shared_friends: usize,
    pub my_friends: usize,
    pub sender_policy: TrustPolicy,
}

/// Returns the priority the receiver assigns to its copy of a message.
///
/// `SigmoidFractionOfFriends` draws its noise sample even when the result is
/// then overridden by the epsilon floor, so the generator advances the same
/// way regardless of graph shape.
pub fn rescaled<R: Rng + ?Sized>(
    input: TrustInput,
    receiver_policy: TrustPolicy,
    params: &TrustParams,
    rng: &mut R,
) -> f64 {
    input.priority * trust_multiplier(input, receiver_policy, params, rng)
}

pub fn trust_multiplier<R: Rng + ?Sized>(
    input: TrustInput,
    receiver_policy: TrustPolicy,
    params: &TrustParams,
    rng: &mut R,
) -> f64 {
    let shared = input.shared_friends as f64;
    match receiver_policy {
        TrustPolicy::MaxFriends => {
            if input.shared_friends == 0 {
                params.epsilon_trust
            } else {
                shared / f64::from(params.max_friends.max(1))
            }
        }
        TrustPolicy::FractionOfFriends => {
            if input.shared_friends == 0 || input.my_friends == 0 {
                params.epsilon_trust
            } else {
                shared / input.my_friends as f64
            }
        }
        TrustPolicy::SigmoidFractionOfFriends => {
            let fraction = if input.my_friends == 0 {
                0.0
            } else {
                shared / input.my_friends as f64
            };
            let noise = Gaussian::new(params.noise_mean, params.noise_variance).sample(rng);
            let noisy = (sigmoid(fraction, params.sigmoid_cutoff, params.sigmoid_rate) + noise)
                .clamp(0.0, 1.0);
            if input.shared_friends == 0 {
                params.epsilon_trust
            } else {
                noisy
            }
        }
        TrustPolicy::Adversary | TrustPolicy::AdversaryJammer => {
            if input.sender_policy.is_adversary() {
                1.0
            } else {
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn input(priority: f64, shared: usize, mine: usize) -> TrustInput {
        TrustInput {
            priority,
            shared_friends: shared,
            my_friends: mine,
            sender_policy: TrustPolicy::SigmoidFractionOfFriends,
        }
    }

    #[test]
    fn max_friends_without_shared_friends_floors_to_epsilon() {
        let mut rng = StdRng::seed_from_u64(0);
        let out = rescaled(
            input(0.8, 0, 10),
            TrustPolicy::MaxFriends,
            &TrustParams::default(),
            &mut rng,
        );
        assert!((out - 0.0008).abs() < 1e-12);
    }

    #[test]
    fn max_friends_scales_by_ceiling() {
        let mut rng = StdRng::seed_from_u64(0);
        let out = rescaled(
            input(1.0, 10, 12),
            TrustPolicy::MaxFriends,
            &TrustParams::default(),
            &mut rng,
        );
        assert!((out - 0.25).abs() < 1e-12);
    }

    #[test]
    fn fraction_of_friends_uses_own_friend_count() {
        let mut rng = StdRng::seed_from_u64(0);
        let params = TrustParams::default();
        let out = rescaled(input(0.5, 3, 4), TrustPolicy::FractionOfFriends, &params, &mut rng);
        assert!((out - 0.375).abs() < 1e-12);
        let floored = rescaled(input(0.5, 0, 4), TrustPolicy::FractionOfFriends, &params, &mut rng);
        assert!((floored - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn sigmoid_output_stays_within_priority_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        let params = TrustParams::default();
        for shared in 0..=10 {
            for _ in 0..50 {
                let out = rescaled(
                    input(0.7, shared, 10),
                    TrustPolicy::SigmoidFractionOfFriends,
                    &params,
                    &mut rng,
                );
                assert!((0.0..=0.7).contains(&out), "out of range: {out}");
            }
        }
    }

    #[test]
    fn sigmoid_with_no_shared_friends_still_consumes_noise() {
        let params = TrustParams::default();
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        let out = rescaled(input(1.0, 0, 3), TrustPolicy::SigmoidFractionOfFriends, &params, &mut a);
        assert_eq!(out, params.epsilon_trust);
        Gaussian::new(0.0, 0.1).sample(&mut b);
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }

    #[test]
    fn adversaries_trust_only_adversaries() {
        let mut rng = StdRng::seed_from_u64(0);
        let params = TrustParams::default();
        let from_honest = TrustInput {
            sender_policy: TrustPolicy::MaxFriends,
            ..input(0.9, 5, 5)
        };
        let from_jammer = TrustInput {
            sender_policy: TrustPolicy::AdversaryJammer,
            ..input(0.9, 0, 5)
        };
        assert_eq!(rescaled(from_honest, TrustPolicy::Adversary, &params, &mut rng), 0.0);
        assert_eq!(rescaled(from_jammer, TrustPolicy::Adversary, &params, &mut rng), 0.9);
        assert_eq!(
            rescaled(from_jammer, TrustPolicy::AdversaryJammer, &params, &mut rng),
            0.9
        );
    }
}
