//! Error types for the Handlebars view engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HandlebarsError>;

#[derive(Error, Debug)]
pub enum HandlebarsError {
    #[error("View not found: {0}")]
    TemplateNotFound(String),

    #[error("View rendering error: {0}")]
    RenderError(String),

    #[error("View parsing error: {0}")]
    ParseError(String),

    /// IO error when loading views
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<handlebars::RenderError> for HandlebarsError {
    fn from(err: handlebars::RenderError) -> Self {
        HandlebarsError::RenderError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for HandlebarsError {
    fn from(err: handlebars::TemplateError) -> Self {
        HandlebarsError::ParseError(err.to_string())
    }
}

impl From<HandlebarsError> for galaxy_core::Error {
    fn from(err: HandlebarsError) -> Self {
        match err {
            HandlebarsError::Io(e) => galaxy_core::Error::Io(e),
            other => galaxy_core::Error::View(other.to_string()),
        }
    }
}
