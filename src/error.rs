use thiserror::Error;

/// Failure taxonomy for one pipeline run. Input, configuration, resource and
/// cancellation errors abort the run; numerical errors are recovered at their
/// unit of work (the offending feature or module is excluded); lookup errors
/// are isolated to their category pair.
#[derive(Debug, Error)]
pub enum CoexnetError {
    #[error("input error: {0}")]
    Input(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("gene-set source unavailable for {category}: {reason}")]
    ExternalLookup { category: String, reason: String },

    #[error("resource limit exceeded: {0}")]
    Resource(String),

    #[error("run cancelled during {0}")]
    Cancelled(&'static str),
}
