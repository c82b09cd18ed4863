// src/error.rs

use thiserror::Error;

pub type VrResult<T> = Result<T, VrError>;

/// Failures reported by the VR display layer. None of these are fatal: the
/// desktop render path stays available whatever happens here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VrError {
    #[error("WebVR not supported")]
    Unsupported,

    #[error("No devices available able to present.")]
    NoPresentableDisplay,

    #[error("display enumeration failed: {0}")]
    Enumeration(String),

    #[error("Unable to present with this device {0}")]
    PresentRejected(String),

    #[error("display is not presenting")]
    NotPresenting,
}

/// Failures loading an image asset. The renderer falls back to the untextured tint.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("no embedded asset named {0}")]
    NotFound(String),

    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}
