use std::io;
use thiserror::Error;

use silinit_raw::FabricDeviceType;

use crate::dispatch::{DispatchError, NotSupported};

#[derive(Error, Debug)]
pub enum SilError {
    #[error("Invalid parameter: {what} = {value} (limit {limit})")]
    InvalidParameter {
        what: &'static str,
        value: u32,
        limit: u32,
    },

    #[error("Operation table unavailable: {0}")]
    Unavailable(#[from] DispatchError),

    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("No {} device map on die", .0.name())]
    MissingDeviceMap(FabricDeviceType),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<NotSupported> for SilError {
    fn from(e: NotSupported) -> Self {
        SilError::NotSupported(e.0)
    }
}

impl SilError {
    /// Bounds violation on a caller-supplied index
    pub fn out_of_range(what: &'static str, value: u32, limit: u32) -> Self {
        SilError::InvalidParameter { what, value, limit }
    }
}

pub type Result<T> = std::result::Result<T, SilError>;
