use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("insufficient data: requested {requested} transitions but only {available} are stored")]
    InsufficientData { requested: usize, available: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("weight blob could not be encoded or decoded: {0}")]
    Codec(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed network: {0}")]
    MalformedModel(String),

    #[error("checkpoint network maps {found_inputs} inputs to {found_outputs} outputs, expected {expected_inputs} to {expected_outputs}")]
    IncompatibleModel {
        expected_inputs: usize,
        expected_outputs: usize,
        found_inputs: usize,
        found_outputs: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
