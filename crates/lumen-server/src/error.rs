//! Errors surfaced by the world service binary.

use lumen_chunk::{DecodeError, EncodeError, RegistryError, StoreError};
use lumen_config::ConfigError;
use lumen_lighting::LightAreaError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A flat terrain layer names a block the registry does not know.
    #[error("unknown block {0:?} in world.flat_layers")]
    UnknownBlock(String),
    #[error(transparent)]
    Light(#[from] LightAreaError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// A chunk read back differs from the chunk written.
    #[error("chunk ({x}, {z}) changed across a {stage} round trip")]
    RoundTrip { x: i32, z: i32, stage: &'static str },
}
