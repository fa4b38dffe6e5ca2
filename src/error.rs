//! Error types for the preview renderer.

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building a renderer from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(String),

    #[error("Invalid environment `{name}`: {message}")]
    InvalidEnvironment { name: String, message: String },

    #[error("Invalid macro `{name}`: {message}")]
    InvalidMacro { name: String, message: String },
}

/// Errors raised for a single unit of content (one math span, one algorithm block).
///
/// These never escape a render call: the pipeline turns them into error markers.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Math rendering error: {0}")]
    Math(String),

    #[error("Macro expansion error: {0}")]
    Macro(String),

    #[error("Algorithm conversion error: {0}")]
    Algorithm(String),

    #[error("Highlighting error: {0}")]
    Highlight(String),
}
