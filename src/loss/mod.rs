pub mod mse;

pub use mse::{MseLoss, MseTracker, evaluate_mse};
