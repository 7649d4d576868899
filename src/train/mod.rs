pub mod backprop;
pub mod dropout;
pub mod parallel;
pub mod session;

pub use backprop::GradientBatch;
pub use dropout::DropoutMask;
pub use parallel::TrainingSession;
pub use session::{MaskPolicy, TrainAlgorithm, TrainingConfig};
