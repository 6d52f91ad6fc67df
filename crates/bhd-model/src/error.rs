use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown logical type: {0}")]
    UnknownLogicalType(String),
    #[error("unknown output format: {0}")]
    UnknownOutputFormat(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
