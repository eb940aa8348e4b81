use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Required column missing: {0}")]
    MissingColumn(String),

    #[error("Duplicate record id: {0}")]
    DuplicateRecord(String),

    #[error("Missing record id in row {0}")]
    MissingId(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
