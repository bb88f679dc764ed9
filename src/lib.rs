#![allow(clippy::must_use_candidate)]
//! Gradient-based adversarial example generation for differentiable models.
//!
//! The core is an iterative projected-gradient-descent driver ([`PgdAttack`])
//! with the single-step sign attack ([`FgsmAttack`]) as a special case, built
//! on three numeric primitives: uniform random initialization
//! ([`init::rand_init`]), gradient-step normalization
//! ([`norm::normalize_step`]), and projection onto an L-p ball
//! ([`norm::project_ball`]). The model, the loss, and the autodiff engine sit
//! behind the [`Differentiable`] trait; a small analytic network ([`dnn`])
//! implements it in-tree for tests and reference use.
//!
//! Tensors are `ndarray` arrays with independent samples along the last axis;
//! a single sample is shaped `[d, 1]`.

pub mod attacks;
pub mod dnn;
mod error;
pub mod gradient;
pub mod init;
pub mod loss;
pub mod norm;
mod test_util;

pub use attacks::{
    fgsm, fgsm_in_place, pgd, pgd_in_place, FgsmAttack, FgsmConfig, Goal, PgdAttack, PgdConfig,
};
pub use error::{AttackError, Result};
pub use gradient::{estimate_gradient, Differentiable, GradientFn};
pub use norm::Norm;

/// Element type used by the attack drivers.
pub type AdvexFloat = f64;
