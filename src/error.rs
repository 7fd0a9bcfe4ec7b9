//! Typed errors for conditions the renderer recovers from or reports to callers.
//!
//! Fatal setup failures (no adapter, no surface) stay `anyhow::Error`s.

use thiserror::Error;

use crate::data_structures::material::ParseColorError;

/// Runtime conditions that are logged and recovered from.
#[derive(Debug, Error)]
pub enum CarouselError {
    #[error("failed to load asset {path}")]
    AssetLoadFailure {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("invalid viewport size {width}x{height}, clamping to at least 1x1")]
    InvalidViewportSize { width: f64, height: f64 },
}

impl CarouselError {
    pub fn asset_load_failure(path: &str, source: anyhow::Error) -> Self {
        Self::AssetLoadFailure {
            path: path.to_string(),
            source: source.into(),
        }
    }
}

/// Violations of scene construction invariants.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("mesh {mesh:?} has {provided} materials but its geometry needs {required}")]
    MaterialGroupMismatch {
        mesh: String,
        required: usize,
        provided: usize,
    },
    #[error("unknown geometry {0}")]
    UnknownGeometry(usize),
    #[error("unknown material {0}")]
    UnknownMaterial(usize),
    #[error("unknown node {0}")]
    UnknownNode(usize),
    #[error(transparent)]
    InvalidColor(#[from] ParseColorError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn asset_failure_keeps_its_cause() {
        let err = CarouselError::asset_load_failure(
            "images/window.png",
            anyhow::anyhow!("file not found"),
        );
        assert_eq!(err.to_string(), "failed to load asset images/window.png");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("file not found"));
    }
}
