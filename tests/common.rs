use advex_rs::dnn::{Dense, ReLU, DNN};
use ndarray::Array;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::Rng;

pub fn dense<R: Rng>(in_dim: usize, out_dim: usize, rng: &mut R) -> Dense {
    let dist = Normal::new(0., 1.).unwrap();
    Dense::new(
        Array::random_using((out_dim, in_dim), dist, rng),
        Array::random_using(out_dim, dist, rng),
    )
}

/// Fully-connected ReLU network `in_dim -> width^num_hidden -> out_dim`.
pub fn make_dnn<R: Rng>(
    in_dim: usize,
    width: usize,
    out_dim: usize,
    num_hidden: usize,
    rng: &mut R,
) -> DNN {
    let mut dnn = DNN::default();
    let mut prev = in_dim;
    for _ in 0..num_hidden {
        dnn.add_layer(Box::new(dense(prev, width, rng)));
        dnn.add_layer(Box::new(ReLU));
        prev = width;
    }
    dnn.add_layer(Box::new(dense(prev, out_dim, rng)));
    dnn
}
