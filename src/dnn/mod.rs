pub mod dense;
pub mod dnn;
pub mod layer;
pub mod objective;
pub mod relu;

pub use dense::Dense;
pub use dnn::DNN;
pub use layer::Layer;
pub use objective::DnnObjective;
pub use relu::ReLU;
