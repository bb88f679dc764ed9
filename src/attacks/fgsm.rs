//! Fast-gradient-sign attack: one-step L-infinity PGD under a named entry
//! point.
use crate::attacks::pgd::{Goal, PgdAttack, PgdConfig};
use crate::error::Result;
use crate::gradient::Differentiable;
use crate::norm::Norm;
use crate::AdvexFloat;
use ndarray::{Array, Dimension, RemoveAxis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Parameters of a fast-gradient-sign attack.
///
/// Everything a one-step sign attack leaves free: the step magnitude is the
/// whole budget `eps` and the norms are L-infinity by construction.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FgsmConfig {
    /// Perturbation budget; also the magnitude of the single sign step.
    pub eps: AdvexFloat,
    /// Legal data range of the finished sample.
    pub clamp_range: (AdvexFloat, AdvexFloat),
    /// Range of the random initialization; `clamp_range` when unset.
    pub init_range: Option<(AdvexFloat, AdvexFloat)>,
    /// Gradient draws averaged for the single step.
    pub mc_samples: usize,
}

impl Default for FgsmConfig {
    fn default() -> Self {
        Self {
            eps: 0.5,
            clamp_range: (0.0, 1.0),
            init_range: None,
            mc_samples: 1,
        }
    }
}

impl From<FgsmConfig> for PgdConfig {
    fn from(config: FgsmConfig) -> Self {
        Self {
            nsteps: 1,
            eps: config.eps,
            alpha: None,
            eps_norm: Norm::Inf,
            alpha_norm: None,
            clamp_range: config.clamp_range,
            init_range: config.init_range,
            project: true,
            mc_samples: config.mc_samples,
        }
    }
}

/// Single-step sign attack. Not a separate algorithm: the driver is
/// [`PgdAttack`] with one iteration under the L-infinity norm, so the step is
/// `eps * sign(gradient)` followed by the usual projection and clamp.
pub struct FgsmAttack {
    inner: PgdAttack,
}

impl FgsmAttack {
    pub fn new(config: FgsmConfig) -> Self {
        Self {
            inner: PgdAttack::new(config.into()),
        }
    }

    /// Run the attack on a copy of `x`, leaving the caller's tensor untouched.
    pub fn run<D, Y, O, R>(
        &self,
        objective: &O,
        x: &Array<AdvexFloat, D>,
        goal: Goal<Y>,
        rng: &mut R,
    ) -> Result<Array<AdvexFloat, D>>
    where
        D: Dimension + RemoveAxis,
        Y: ?Sized,
        O: Differentiable<D, Y>,
        R: Rng + ?Sized,
    {
        self.inner.run(objective, x, goal, rng)
    }

    /// Run the attack, mutating `x` into the adversarial sample.
    pub fn run_in_place<D, Y, O, R>(
        &self,
        objective: &O,
        x: &mut Array<AdvexFloat, D>,
        goal: Goal<Y>,
        rng: &mut R,
    ) -> Result<()>
    where
        D: Dimension + RemoveAxis,
        Y: ?Sized,
        O: Differentiable<D, Y>,
        R: Rng + ?Sized,
    {
        self.inner.run_in_place(objective, x, goal, rng)
    }
}

/// Fast-gradient-sign attack on a copy of `x`.
///
/// # Errors
/// See [`crate::AttackError`]; the caller's tensor is untouched on error.
pub fn fgsm<D, Y, O, R>(
    objective: &O,
    x: &Array<AdvexFloat, D>,
    goal: Goal<Y>,
    config: &FgsmConfig,
    rng: &mut R,
) -> Result<Array<AdvexFloat, D>>
where
    D: Dimension + RemoveAxis,
    Y: ?Sized,
    O: Differentiable<D, Y>,
    R: Rng + ?Sized,
{
    FgsmAttack::new(config.clone()).run(objective, x, goal, rng)
}

/// Fast-gradient-sign attack mutating `x` in place.
///
/// # Errors
/// See [`crate::AttackError`].
pub fn fgsm_in_place<D, Y, O, R>(
    objective: &O,
    x: &mut Array<AdvexFloat, D>,
    goal: Goal<Y>,
    config: &FgsmConfig,
    rng: &mut R,
) -> Result<()>
where
    D: Dimension + RemoveAxis,
    Y: ?Sized,
    O: Differentiable<D, Y>,
    R: Rng + ?Sized,
{
    FgsmAttack::new(config.clone()).run_in_place(objective, x, goal, rng)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fgsm_config_is_one_step_linf_pgd() {
        let pgd: PgdConfig = FgsmConfig {
            eps: 0.25,
            ..FgsmConfig::default()
        }
        .into();
        assert_eq!(pgd.nsteps, 1);
        assert_eq!(pgd.eps_norm, Norm::Inf);
        let resolved = pgd.resolve().unwrap();
        // the single step spends the whole budget in one sign move
        assert_eq!(resolved.alpha, 0.25);
        assert_eq!(resolved.alpha_norm, Norm::Inf);
    }
}
