use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid capacity {0}: must be at least 1000 and addressable with 64-bit indices")]
    InvalidCapacity(u64),

    #[error("Error rate must be between 0 and 1 exclusive, got {0}")]
    InvalidErrorRate(f64),

    #[error("Filter file size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
