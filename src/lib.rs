pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod data;
pub mod loss;
pub mod optim;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use data::dataset::TrainingData;
pub use loss::mse::{evaluate_mse, MseLoss, MseTracker};
pub use optim::sgd::Sgd;
pub use train::parallel::TrainingSession;
pub use train::session::{MaskPolicy, TrainAlgorithm, TrainingConfig};
pub use error::TrainError;
