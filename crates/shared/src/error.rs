use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::EffectType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("all {effect_type} slots are in use")]
    CapacityExceeded { effect_type: EffectType },
    #[error("unknown effect type {0}")]
    UnknownEffectType(EffectType),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown ioType {0:?}")]
    UnknownIoType(String),
    #[error("unknown ioFlag {0:?}")]
    UnknownIoFlag(String),
    #[error("ioFlag required for {0}")]
    MissingIoFlag(&'static str),
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("invalid {io_type} payload: {source}")]
    InvalidPayload {
        io_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
