//! Error types for Simpack
//!
//! Uses `thiserror` for library errors. Every variant carries the identifier
//! that caused the failure (dependency name, asset name, placeholder token)
//! so the CLI can report exactly which stage broke the build.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Simpack operations
pub type SimpackResult<T> = Result<T, SimpackError>;

/// Main error type for Simpack operations
#[derive(Error, Debug)]
pub enum SimpackError {
    /// Missing required field in the package descriptor
    #[error("missing required field '{field}' in {file}")]
    MissingField { field: String, file: PathBuf },

    /// The same dependency was declared twice
    #[error("duplicate dependency '{name}' in {file}")]
    DuplicateDependency { name: String, file: PathBuf },

    /// A version-control metadata query failed
    #[error("version control query failed for '{dependency}': {message}")]
    VcsQuery { dependency: String, message: String },

    /// A mipmap generation call failed
    #[error("mipmap generation failed for '{asset}': {message}")]
    MipmapFailed { asset: String, message: String },

    /// A template token survived substitution into the built artifact
    #[error("template token leaked into built artifact: {token}")]
    PlaceholderLeak { token: String },

    /// The title string key has no value for a requested locale
    #[error("missing title string '{key}' for locale '{locale}'")]
    MissingTitleString { key: String, locale: String },

    /// A requested locale has no string map at all
    #[error("no strings available for locale '{locale}'")]
    MissingLocale { locale: String },

    /// A license manifest exists but cannot be parsed
    #[error("malformed license manifest {file}: {message}")]
    MalformedManifest { file: PathBuf, message: String },

    /// Build configuration problem
    #[error("invalid config in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
