use thiserror::Error;

use crate::host::Capability;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(Capability),

    #[error("Unknown easing: {0}")]
    UnknownEasing(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
