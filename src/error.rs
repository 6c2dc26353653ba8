use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("shape mismatch: {0}")]
    Shape(String),
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("empty input: {0}")]
    Empty(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fails with [`Error::Shape`] unless `actual == expected`.
pub(crate) fn ensure_shape(actual: usize, expected: usize, what: &str) -> Result<()> {
    if actual != expected {
        return Err(Error::Shape(format!(
            "{what}: got {actual}, expected {expected}"
        )));
    }
    Ok(())
}

/// Fails with [`Error::Empty`] when `count` is zero.
pub(crate) fn ensure_non_empty(count: usize, what: &str) -> Result<()> {
    if count == 0 {
        return Err(Error::Empty(format!("{what} must not be empty")));
    }
    Ok(())
}
