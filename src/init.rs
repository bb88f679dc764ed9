//! Random perturbation initialization.
use ndarray::{Array, Dimension};
use ndarray_rand::RandomExt;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::Uniform;
use rand::Rng;

/// Element types `rand_init` can draw uniformly over a range.
///
/// Integer types sample the inclusive range `[lo, hi]`; float types sample
/// the half-open range `[lo, hi)`, i.e. `lo + (hi - lo) * U(0, 1)`.
pub trait UniformInit: SampleUniform + PartialEq + Copy {
    fn distribution(lo: Self, hi: Self) -> Uniform<Self>;
}

macro_rules! impl_uniform_init_int {
    ($($t:ty),*) => {$(
        impl UniformInit for $t {
            fn distribution(lo: Self, hi: Self) -> Uniform<Self> {
                Uniform::new_inclusive(lo, hi)
            }
        }
    )*};
}

macro_rules! impl_uniform_init_float {
    ($($t:ty),*) => {$(
        impl UniformInit for $t {
            fn distribution(lo: Self, hi: Self) -> Uniform<Self> {
                Uniform::new(lo, hi)
            }
        }
    )*};
}

impl_uniform_init_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_uniform_init_float!(f32, f64);

/// Fresh tensor shaped like `x` with elements drawn i.i.d. uniform over
/// `range`. A degenerate range (`lo == hi`) yields a constant tensor.
///
/// Pure in everything but the RNG state.
///
/// # Panics
/// If `range` is inverted (`lo > hi`).
pub fn rand_init<T, D, R>(x: &Array<T, D>, range: (T, T), rng: &mut R) -> Array<T, D>
where
    T: UniformInit,
    D: Dimension,
    R: Rng + ?Sized,
{
    let (lo, hi) = range;
    if lo == hi {
        return Array::from_elem(x.raw_dim(), lo);
    }
    Array::random_using(x.raw_dim(), T::distribution(lo, hi), rng)
}
