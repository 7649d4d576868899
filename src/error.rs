use thiserror::Error;

/// Errors surfaced by training, evaluation, and dataset loading.
///
/// Every error is fatal for the operation that raised it: an epoch that
/// fails leaves the network exactly as it was before the call (no partial
/// weight update is ever applied), and a session that fails validation
/// never starts training.
#[derive(Debug, Error)]
pub enum TrainError {
    /// An example's shape does not match the network's input or output layer.
    #[error("dimension mismatch: expected {expected} values, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A session parameter is out of range (checked before training starts).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The OS refused to create a worker thread (resource exhaustion).
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(std::io::Error),

    /// A worker thread panicked; the epoch was discarded.
    #[error("worker thread panicked during epoch")]
    WorkerPanic,

    /// The dataset file is not valid FANN-style text data.
    #[error("malformed dataset at line {line}: {msg}")]
    DatasetFormat { line: usize, msg: String },

    /// I/O failure reading a dataset or writing a model file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrainError>;
