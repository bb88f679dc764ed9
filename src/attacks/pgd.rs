//! Projected-gradient-descent attack driver.
use crate::error::{AttackError, Result};
use crate::gradient::{estimate_gradient, Differentiable};
use crate::init::rand_init;
use crate::norm::{normalize_step, project_ball, Norm};
use crate::AdvexFloat;
use log::{debug, log_enabled, trace, Level};
use ndarray::{Array, Dimension, RemoveAxis, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Direction of the attack and the value handed to the loss.
///
/// An untargeted attack climbs the loss away from the true label; a targeted
/// attack descends the loss toward a chosen target.
#[derive(Clone, Copy, Debug)]
pub enum Goal<'a, Y: ?Sized> {
    Untargeted(&'a Y),
    Targeted(&'a Y),
}

impl<'a, Y: ?Sized> Goal<'a, Y> {
    /// The label or target handed to the loss function.
    pub fn target(&self) -> &'a Y {
        match self {
            Self::Untargeted(y) | Self::Targeted(y) => *y,
        }
    }

    pub fn is_targeted(&self) -> bool {
        matches!(self, Self::Targeted(_))
    }
}

/// Parameters of a projected-gradient-descent attack.
///
/// Fields left `None` are resolved from the others at call entry:
/// `alpha = eps / nsteps`, `alpha_norm = eps_norm`,
/// `init_range = clamp_range`. The defaults split the whole budget evenly
/// across steps and initialize within the same legal data range the finished
/// sample is clamped to.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PgdConfig {
    /// Gradient iterations.
    pub nsteps: usize,
    /// Perturbation budget, the radius of the constraint ball.
    pub eps: AdvexFloat,
    /// Per-step magnitude; `eps / nsteps` when unset.
    pub alpha: Option<AdvexFloat>,
    /// Norm of the constraint ball.
    pub eps_norm: Norm,
    /// Norm under which each step is rescaled; `eps_norm` when unset.
    pub alpha_norm: Option<Norm>,
    /// Legal data range of the finished sample.
    pub clamp_range: (AdvexFloat, AdvexFloat),
    /// Range of the random initialization; `clamp_range` when unset.
    pub init_range: Option<(AdvexFloat, AdvexFloat)>,
    /// Project the perturbation onto the constraint ball every iteration.
    pub project: bool,
    /// Gradient draws averaged per iteration.
    pub mc_samples: usize,
}

impl PgdConfig {
    pub fn new(nsteps: usize) -> Self {
        Self {
            nsteps,
            ..Self::default()
        }
    }

    /// Fill in the dependent defaults, then validate.
    pub(crate) fn resolve(&self) -> Result<ResolvedPgd> {
        if self.nsteps == 0 {
            return Err(AttackError::InvalidConfig {
                reason: "nsteps must be at least 1".into(),
            });
        }
        if self.mc_samples == 0 {
            return Err(AttackError::InvalidConfig {
                reason: "mc_samples must be at least 1".into(),
            });
        }
        if self.clamp_range.0 > self.clamp_range.1 {
            return Err(AttackError::InvalidConfig {
                reason: format!("inverted clamp_range {:?}", self.clamp_range),
            });
        }
        let init_range = self.init_range.unwrap_or(self.clamp_range);
        if init_range.0 > init_range.1 {
            return Err(AttackError::InvalidConfig {
                reason: format!("inverted init_range {:?}", init_range),
            });
        }
        Ok(ResolvedPgd {
            nsteps: self.nsteps,
            eps: self.eps,
            alpha: self.alpha.unwrap_or(self.eps / self.nsteps as AdvexFloat),
            eps_norm: self.eps_norm,
            alpha_norm: self.alpha_norm.unwrap_or(self.eps_norm),
            clamp_range: self.clamp_range,
            init_range,
            project: self.project,
            mc_samples: self.mc_samples,
        })
    }
}

impl Default for PgdConfig {
    fn default() -> Self {
        Self {
            nsteps: 10,
            eps: 0.5,
            alpha: None,
            eps_norm: Norm::P(2.0),
            alpha_norm: None,
            clamp_range: (0.0, 1.0),
            init_range: None,
            project: true,
            mc_samples: 1,
        }
    }
}

/// A [`PgdConfig`] with every default made explicit.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ResolvedPgd {
    pub nsteps: usize,
    pub eps: AdvexFloat,
    pub alpha: AdvexFloat,
    pub eps_norm: Norm,
    pub alpha_norm: Norm,
    pub clamp_range: (AdvexFloat, AdvexFloat),
    pub init_range: (AdvexFloat, AdvexFloat),
    pub project: bool,
    pub mc_samples: usize,
}

/// Iterative projected-gradient-descent attack.
///
/// Each invocation owns a fresh perturbation: it is drawn uniformly over the
/// init range, updated by a normalized gradient step per iteration, projected
/// onto the constraint ball when projection is on, and folded into the sample
/// at the end, followed by the final clamp. The input tensor itself is only
/// touched at that final fold, so gradients are always taken at
/// `original + perturbation`.
pub struct PgdAttack {
    config: PgdConfig,
}

impl PgdAttack {
    pub fn new(config: PgdConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PgdConfig {
        &self.config
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
        let mut adv = x.to_owned();
        self.run_in_place(objective, &mut adv, goal, rng)?;
        Ok(adv)
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
        let cfg = self.config.resolve()?;
        let mut delta = rand_init(x, cfg.init_range, rng);
        for step in 0..cfg.nsteps {
            let x_adv = &*x + &delta;
            if log_enabled!(Level::Trace) {
                trace!(
                    "step {}: loss {}",
                    step,
                    objective.loss(&x_adv, goal.target())?
                );
            }
            let mut grads = estimate_gradient(objective, &x_adv, goal.target(), cfg.mc_samples)?;
            normalize_step(&mut grads, cfg.alpha, cfg.alpha_norm)?;
            if goal.is_targeted() {
                delta -= &grads;
            } else {
                delta += &grads;
            }
            if cfg.project {
                project_ball(&mut delta, cfg.eps, cfg.eps_norm)?;
            }
        }
        let (lo, hi) = cfg.clamp_range;
        Zip::from(&mut *x)
            .and(&delta)
            .for_each(|xi, di| *xi = (*xi + di).clamp(lo, hi));
        debug!(
            "pgd finished: {} steps of {} under {}, eps {} under {}",
            cfg.nsteps, cfg.alpha, cfg.alpha_norm, cfg.eps, cfg.eps_norm
        );
        Ok(())
    }
}

/// Projected-gradient-descent attack on a copy of `x`.
///
/// # Errors
/// See [`AttackError`]; the caller's tensor is untouched on error.
pub fn pgd<D, Y, O, R>(
    objective: &O,
    x: &Array<AdvexFloat, D>,
    goal: Goal<Y>,
    config: &PgdConfig,
    rng: &mut R,
) -> Result<Array<AdvexFloat, D>>
where
    D: Dimension + RemoveAxis,
    Y: ?Sized,
    O: Differentiable<D, Y>,
    R: Rng + ?Sized,
{
    PgdAttack::new(config.clone()).run(objective, x, goal, rng)
}

/// Projected-gradient-descent attack mutating `x` in place.
///
/// # Errors
/// See [`AttackError`].
pub fn pgd_in_place<D, Y, O, R>(
    objective: &O,
    x: &mut Array<AdvexFloat, D>,
    goal: Goal<Y>,
    config: &PgdConfig,
    rng: &mut R,
) -> Result<()>
where
    D: Dimension + RemoveAxis,
    Y: ?Sized,
    O: Differentiable<D, Y>,
    R: Rng + ?Sized,
{
    PgdAttack::new(config.clone()).run_in_place(objective, x, goal, rng)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_resolve_splits_budget_evenly() {
        let config = PgdConfig {
            nsteps: 7,
            eps: 0.35,
            ..PgdConfig::default()
        };
        let resolved = config.resolve().unwrap();
        assert_abs_diff_eq!(
            resolved.alpha * resolved.nsteps as AdvexFloat,
            resolved.eps,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_resolve_defaults_follow_explicit_fields() {
        let config = PgdConfig {
            eps_norm: Norm::Inf,
            clamp_range: (-1.0, 1.0),
            ..PgdConfig::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.alpha_norm, Norm::Inf);
        assert_eq!(resolved.init_range, (-1.0, 1.0));
    }

    #[test]
    fn test_resolve_keeps_explicit_overrides() {
        let config = PgdConfig {
            alpha: Some(0.02),
            alpha_norm: Some(Norm::P(1.0)),
            init_range: Some((0.0, 0.0)),
            ..PgdConfig::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.alpha, 0.02);
        assert_eq!(resolved.alpha_norm, Norm::P(1.0));
        assert_eq!(resolved.init_range, (0.0, 0.0));
    }

    #[test]
    fn test_resolve_rejects_degenerate_configs() {
        for config in [
            PgdConfig {
                nsteps: 0,
                ..PgdConfig::default()
            },
            PgdConfig {
                mc_samples: 0,
                ..PgdConfig::default()
            },
            PgdConfig {
                clamp_range: (1.0, 0.0),
                ..PgdConfig::default()
            },
            PgdConfig {
                init_range: Some((0.5, -0.5)),
                ..PgdConfig::default()
            },
        ] {
            assert!(matches!(
                config.resolve(),
                Err(AttackError::InvalidConfig { .. })
            ));
        }
    }
}
