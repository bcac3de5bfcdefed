//! Error types for the compression pipeline.

use std::path::PathBuf;

use camino::Utf8PathBuf;

/// Errors that can occur while compressing a stylesheet.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input stylesheet could not be read.
    #[error("failed to read stylesheet {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file named by `@import url(...)` could not be read.
    #[error("failed to inline import {path}")]
    Import {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An image named by `url(...)` in a background declaration could not be read.
    #[error("failed to embed image {path}")]
    Asset {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The result cache could not be read or written.
    #[error("cache error at {path}")]
    Cache {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The prefix table was rejected.
    #[error(transparent)]
    Prefix(#[from] vendorize_prefix::Error),

    /// A path could not be represented as UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
