// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while synchronizing viewer state with a rendering engine.
///
/// Only the lifecycle variants (`InitializationTimeout`, `AssetUnreachable`,
/// `AssetParse`, `NotConverted`, `Unmounted`, `Engine`) ever reach the UI.
/// The others are recovered where they occur and logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Element {element_id} has no live object in model {model_id}")]
    ResolutionMiss { model_id: String, element_id: String },

    #[error("Engine build offers no way to apply `{effect}`")]
    CapabilityUnavailable { effect: &'static str },

    #[error("{stage} not ready after {attempts} attempts ({waited_ms} ms)")]
    InitializationTimeout {
        stage: &'static str,
        attempts: u32,
        waited_ms: u64,
    },

    #[error("Model asset is unreachable: {url}")]
    AssetUnreachable { url: String },

    #[error("Model asset {url} was fetched but could not be loaded: {reason}")]
    AssetParse { url: String, reason: String },

    #[error("Model is not ready for viewing (conversion status: {status})")]
    NotConverted { status: String },

    #[error("Invalid metadata document: {0}")]
    Metadata(String),

    #[error("Viewer was unmounted during {stage}")]
    Unmounted { stage: &'static str },

    #[error("Engine error: {0}")]
    Engine(String),
}

impl Error {
    /// Stable machine-readable code for the UI.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ResolutionMiss { .. } => "RESOLUTION_MISS",
            Error::CapabilityUnavailable { .. } => "CAPABILITY_UNAVAILABLE",
            Error::InitializationTimeout { .. } => "INITIALIZATION_TIMEOUT",
            Error::AssetUnreachable { .. } => "ASSET_UNREACHABLE",
            Error::AssetParse { .. } => "ASSET_PARSE",
            Error::NotConverted { .. } => "NOT_CONVERTED",
            Error::Metadata(_) => "METADATA",
            Error::Unmounted { .. } => "UNMOUNTED",
            Error::Engine(_) => "ENGINE",
        }
    }

    /// Whether the error ends the life of a viewer instance.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::ResolutionMiss { .. } | Error::CapabilityUnavailable { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Metadata(err.to_string())
    }
}
