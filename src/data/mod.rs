pub mod dataset;

pub use dataset::TrainingData;
