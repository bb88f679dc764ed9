//! L-p norm primitives: magnitudes, ball projection, and step normalization.
use crate::error::{AttackError, Result};
use crate::AdvexFloat;
use ndarray::{Array, ArrayView, Axis, Dimension, RemoveAxis};
use num::{Float, NumCast};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order of an L-p vector norm.
///
/// Finite orders must be strictly positive; the infinite order gets its own
/// variant rather than `P(f64::INFINITY)`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum Norm {
    /// L-infinity, the maximum absolute element.
    Inf,
    /// L-p for a finite order p > 0.
    P(AdvexFloat),
}

impl Norm {
    /// # Errors
    /// `InvalidNorm` for a finite order that is not strictly positive.
    pub fn validate(self) -> Result<()> {
        match self {
            Self::Inf => Ok(()),
            Self::P(p) if p.is_finite() && p > 0.0 => Ok(()),
            Self::P(p) => Err(AttackError::InvalidNorm { order: p }),
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Inf => write!(f, "Linf"),
            Self::P(p) => write!(f, "L{}", p),
        }
    }
}

/// Magnitude of `v` under `norm`.
///
/// # Errors
/// `InvalidNorm` for a non-positive finite order.
pub fn lp_norm<F, D>(v: &ArrayView<F, D>, norm: Norm) -> Result<F>
where
    F: Float,
    D: Dimension,
{
    norm.validate()?;
    match norm {
        Norm::Inf => Ok(v.fold(F::zero(), |m, x| m.max(x.abs()))),
        Norm::P(p) => {
            let p = <F as NumCast>::from(p).unwrap();
            Ok(v.fold(F::zero(), |acc, x| acc + x.abs().powf(p)).powf(p.recip()))
        }
    }
}

/// Project `delta` onto the L-`norm` ball of radius `eps`, in place.
///
/// Under `Norm::Inf` every element is clamped into `[-eps, eps]` independently.
/// Under a finite order each sample along the last axis is rescaled by
/// `eps / max(n, eps)` when its norm `n` exceeds `eps`, and left untouched
/// otherwise, so the rescale factor never exceeds 1 and samples never interact.
///
/// # Errors
/// `InvalidNorm` for a non-positive finite order.
///
/// # Panics
/// If `delta` is zero-dimensional.
pub fn project_ball<F, D>(delta: &mut Array<F, D>, eps: F, norm: Norm) -> Result<()>
where
    F: Float,
    D: Dimension + RemoveAxis,
{
    norm.validate()?;
    match norm {
        Norm::Inf => {
            delta.mapv_inplace(|v| v.max(-eps).min(eps));
        }
        Norm::P(_) => {
            let batch = Axis(delta.ndim() - 1);
            for mut sample in delta.axis_iter_mut(batch) {
                let n = lp_norm(&sample.view(), norm)?;
                if n > eps {
                    let scale = eps / n.max(eps);
                    sample.mapv_inplace(|v| v * scale);
                }
            }
        }
    }
    Ok(())
}

/// Rescale a raw gradient into a bounded step of magnitude `alpha`, in place.
///
/// Under `Norm::Inf` every element becomes `sign(element) * alpha` (zero stays
/// zero). Under a finite order each sample along the last axis is rescaled so
/// its norm is exactly `alpha`. Unlike [`project_ball`] there is no lower
/// bound on the divisor: a zero-gradient sample divides by zero and the
/// resulting non-finite values reach the caller undisguised.
///
/// # Errors
/// `InvalidNorm` for a non-positive finite order.
///
/// # Panics
/// If `grads` is zero-dimensional.
pub fn normalize_step<F, D>(grads: &mut Array<F, D>, alpha: F, norm: Norm) -> Result<()>
where
    F: Float,
    D: Dimension + RemoveAxis,
{
    norm.validate()?;
    match norm {
        Norm::Inf => {
            grads.mapv_inplace(|g| {
                if g == F::zero() {
                    F::zero()
                } else {
                    g.signum() * alpha
                }
            });
        }
        Norm::P(_) => {
            let batch = Axis(grads.ndim() - 1);
            for mut sample in grads.axis_iter_mut(batch) {
                let n = lp_norm(&sample.view(), norm)?;
                let scale = alpha / n;
                sample.mapv_inplace(|g| g * scale);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::*;
    use approx::assert_abs_diff_eq;
    use more_asserts::assert_le;
    use ndarray::{array, aview1, Axis};
    use proptest::prelude::*;
    use proptest::proptest;

    #[test]
    fn test_lp_norm_known_values() {
        let v = array![3.0, -4.0];
        assert_abs_diff_eq!(lp_norm(&v.view(), Norm::P(2.0)).unwrap(), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lp_norm(&v.view(), Norm::P(1.0)).unwrap(), 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lp_norm(&v.view(), Norm::Inf).unwrap(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_order_rejected() {
        let mut delta = array![[1.0], [2.0]];
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                project_ball(&mut delta, 1.0, Norm::P(bad)),
                Err(AttackError::InvalidNorm { .. })
            ));
            assert!(matches!(
                normalize_step(&mut delta, 1.0, Norm::P(bad)),
                Err(AttackError::InvalidNorm { .. })
            ));
        }
    }

    #[test]
    fn test_inf_projection_is_elementwise_clamp() {
        let mut delta = array![[0.05, -2.0], [1.5, -0.01]];
        project_ball(&mut delta, 0.1, Norm::Inf).unwrap();
        assert_eq!(delta, array![[0.05, -0.1], [0.1, -0.01]]);
    }

    #[test]
    fn test_lp_projection_is_per_sample() {
        // column 0 far over budget, column 1 well inside
        let mut delta = array![[30.0, 0.1], [40.0, 0.2]];
        project_ball(&mut delta, 1.0, Norm::P(2.0)).unwrap();
        let shrunk = delta.index_axis(Axis(1), 0);
        assert_abs_diff_eq!(lp_norm(&shrunk, Norm::P(2.0)).unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(delta.index_axis(Axis(1), 1), aview1(&[0.1, 0.2]));
    }

    #[test]
    fn test_sign_step_magnitude() {
        let mut grads = array![[0.3, -7.0], [0.0, -0.2]];
        normalize_step(&mut grads, 0.1, Norm::Inf).unwrap();
        assert_eq!(grads, array![[0.1, -0.1], [0.0, -0.1]]);
    }

    #[test]
    fn test_zero_gradient_sample_is_not_patched() {
        let mut grads = array![[0.0, 1.0], [0.0, 1.0]];
        normalize_step(&mut grads, 0.1, Norm::P(2.0)).unwrap();
        assert!(grads.index_axis(Axis(1), 0).iter().all(|v| v.is_nan()));
        let live = grads.index_axis(Axis(1), 1);
        assert_abs_diff_eq!(lp_norm(&live, Norm::P(2.0)).unwrap(), 0.1, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn test_lp_projection_bounds_every_sample(
            delta in array2(3, 8),
            eps in 0.01..2.0_f64,
            p in 0.5..4.0_f64,
        ) {
            let mut delta = delta;
            project_ball(&mut delta, eps, Norm::P(p)).unwrap();
            for sample in delta.axis_iter(Axis(1)) {
                assert_le!(lp_norm(&sample, Norm::P(p)).unwrap(), eps * (1.0 + 1e-6));
            }
        }

        #[test]
        fn test_step_rescale_hits_alpha(
            grads in array2(4, 6),
            alpha in 0.01..1.0_f64,
            p in 0.5..4.0_f64,
        ) {
            let mut grads = grads;
            for sample in grads.axis_iter(Axis(1)) {
                prop_assume!(lp_norm(&sample, Norm::P(p)).unwrap() > 1e-6);
            }
            normalize_step(&mut grads, alpha, Norm::P(p)).unwrap();
            for sample in grads.axis_iter(Axis(1)) {
                let n = lp_norm(&sample, Norm::P(p)).unwrap();
                prop_assert!((n - alpha).abs() < alpha * 1e-6 + 1e-9);
            }
        }

        #[test]
        fn test_inf_projection_never_grows_elements(
            delta in array2(3, 5),
            eps in 0.01..2.0_f64,
        ) {
            let before = delta.clone();
            let mut delta = delta;
            project_ball(&mut delta, eps, Norm::Inf).unwrap();
            for (&b, &a) in before.iter().zip(delta.iter()) {
                assert_le!(a.abs(), b.abs().min(eps) + 1e-12);
            }
        }
    }
}
