use thiserror::Error;

pub type Result<T> = std::result::Result<T, TestbedError>;

#[derive(Debug, Error)]
pub enum TestbedError {
    #[error("unknown test mode `{0}` (expected `universal` or `multistage`)")]
    UnknownMode(String),

    /// The backend refused to build a kernel for the operation.
    #[error("kernel `{name}` rejected by the compiler: {reason}")]
    Compile { name: String, reason: String },

    /// The kernel compiled but cannot run this particular problem.
    #[error("kernel `{name}` cannot run problem {problem}: {reason}")]
    NotImplementable {
        name: String,
        problem: String,
        reason: String,
    },

    #[error("invalid launch arguments: {0}")]
    InvalidArguments(String),

    #[error("memory pool exhausted: requested {requested} bytes with {allocated} of {max} bytes in use")]
    PoolExhausted {
        requested: usize,
        allocated: usize,
        max: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
