use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("grid index out of range: x={x}, z={z}, dim={dim}")]
    OutOfRange { x: usize, z: usize, dim: usize },
}

pub type Result<T> = std::result::Result<T, TerrainError>;
