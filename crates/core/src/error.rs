//! Error taxonomy for the style-transfer engine.
//!
//! Every failure is scoped to a single request: the catalog and result cache
//! are never mutated by a failing operation, though the session slot may
//! revert to unloaded (see [`crate::session`]).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Requested model id is not in the catalog.
    #[error("unknown style model: {id}")]
    UnknownModel { id: String },

    /// Network or storage failure while fetching a model artifact.
    /// No partial file is left behind; re-triggering the same action
    /// re-attempts the download.
    #[error("failed to download model {id}: {reason}")]
    ModelDownload { id: String, reason: String },

    /// The artifact exists locally but failed to parse/initialize as a model.
    #[error("failed to load model {id}: {reason}")]
    ModelLoad { id: String, reason: String },

    /// Tensor dimensions do not match the model's declared input size.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    TensorShape { expected: String, actual: String },

    /// The loaded model produced no tensor under its declared output name.
    #[error("model produced no output named '{name}'")]
    MissingOutput { name: String },

    /// `infer` was called with no model loaded. Programming error on the
    /// caller's side; surfaced rather than silently queued.
    #[error("inference session is not ready: no model loaded")]
    NotReady,

    /// The forward pass itself failed inside the runtime.
    #[error("inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode output image: {source}")]
    ImageEncode {
        #[source]
        source: image::ImageError,
    },

    /// Zero-sized or inconsistent source image data, rejected before encode.
    #[error("unsupported image dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("invalid remote filter base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The remote filter API rejected or failed the request.
    #[error("remote filter '{filter}' failed: {reason}")]
    RemoteFilter { filter: String, reason: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("catalog serialization failed: {0}")]
    CatalogJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
