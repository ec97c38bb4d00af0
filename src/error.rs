use thiserror::Error;

/// Errors raised by the sampling core and its configuration layer
#[derive(Debug, Error)]
pub enum McError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Non-finite potential energy ({energy}) {context}")]
    NumericDegeneracy { energy: f64, context: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_yml::Error),
}

pub type Result<T> = std::result::Result<T, McError>;

impl McError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        McError::InvalidConfiguration(msg.into())
    }
}
