//! Error types for the rendering pipeline

use galaxy_cache::{CacheError, GenerateError};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GalaxyError>;

/// Why a component failed to render.
///
/// Cloneable so that every caller waiting on the same cached render gets the
/// same reason.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    Message(String),
    Structured(Value),
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        RenderError::Message(message.into())
    }

    pub fn structured(reason: Value) -> Self {
        RenderError::Structured(reason)
    }

    /// The reason as text; structured reasons are rendered as JSON.
    pub fn reason(&self) -> String {
        match self {
            RenderError::Message(message) => message.clone(),
            RenderError::Structured(value) => value.to_string(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

impl std::error::Error for RenderError {}

impl From<&str> for RenderError {
    fn from(message: &str) -> Self {
        RenderError::new(message)
    }
}

impl From<String> for RenderError {
    fn from(message: String) -> Self {
        RenderError::Message(message)
    }
}

/// Everything that can go wrong between options and a finished document.
#[derive(Debug, Error)]
pub enum GalaxyError {
    /// Malformed plugin, handler or reply options
    #[error("{0}")]
    Config(String),

    /// A view was requested but no view engine is registered
    #[error("view engine must be registered to use view: {view}")]
    ViewEngineMissing { view: String },

    /// The component reference does not point at a renderer
    #[error("could not resolve component: {0}")]
    Resolution(String),

    #[error("render failed: {0}")]
    Render(RenderError),

    #[error("render did not complete within {0:?}")]
    Timeout(Duration),

    #[error("view error: {0}")]
    View(#[source] galaxy_core::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl GalaxyError {
    /// Errors that must abort plugin or route setup.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            GalaxyError::Config(_) | GalaxyError::ViewEngineMissing { .. }
        )
    }

    /// The component's own failure reason, if this is a render failure.
    pub fn render_error(&self) -> Option<&RenderError> {
        match self {
            GalaxyError::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderError> for GalaxyError {
    fn from(err: RenderError) -> Self {
        GalaxyError::Render(err)
    }
}

impl From<GenerateError<RenderError>> for GalaxyError {
    fn from(err: GenerateError<RenderError>) -> Self {
        match err {
            GenerateError::Failed(err) => GalaxyError::Render(err),
            GenerateError::Timeout(after) => GalaxyError::Timeout(after),
            GenerateError::Aborted(reason) => GalaxyError::Render(RenderError::Message(reason)),
            GenerateError::Cache(err) => GalaxyError::Cache(err),
        }
    }
}

impl From<serde_json::Error> for GalaxyError {
    fn from(err: serde_json::Error) -> Self {
        GalaxyError::Serialization(err.to_string())
    }
}

/// Every pipeline failure is a server error to the client.
impl From<GalaxyError> for galaxy_core::Error {
    fn from(err: GalaxyError) -> Self {
        match err {
            GalaxyError::View(inner) if inner.is_server_error() => inner,
            GalaxyError::Serialization(message) => galaxy_core::Error::Serialization(message),
            other => galaxy_core::Error::Internal(other.to_string()),
        }
    }
}
