//! Error taxonomy for the transformation core.
//!
//! `InputFormatError` and `TransientResourceError` are recoverable: the
//! caller logs and drops the offending item or item-publish attempt.
//! `ConfigError` is fatal at startup. `FatalError` wraps anything
//! unexpected that escapes to the module's top level.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unparseable {kind} input: {detail}")]
    InputFormat { kind: &'static str, detail: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transient resource error: {0}")]
    TransientResource(String),

    #[error("fatal error: {0}")]
    Fatal(#[from] anyhow::Error),
}

impl TransformError {
    pub fn input_format(kind: &'static str, detail: impl Into<String>) -> Self {
        TransformError::InputFormat {
            kind,
            detail: detail.into(),
        }
    }
}
