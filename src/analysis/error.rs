use thiserror::Error;

/// Failures raised by the analysis core.
///
/// Configuration errors surface while the descriptor and band model are
/// built, before any frame is touched. Shape errors are per call and leave
/// all shared state untouched.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),

    #[error("frame has {actual} samples, expected {expected}")]
    FrameLength { expected: usize, actual: usize },

    #[error("spectrum has {actual} buckets, expected {expected}")]
    SpectrumLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
