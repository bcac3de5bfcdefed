//! Stylesheet compression: vendor prefixes, inlined imports, embedded
//! images, minification and an on-disk result cache.
//!
//! ```no_run
//! use camino::Utf8Path;
//! use vendorize::Compressor;
//!
//! let compressor = Compressor::with_defaults()?;
//! let out = compressor.compress_file(Utf8Path::new("assets/site.css"))?;
//! println!("{}", out.css);
//! # Ok::<(), vendorize::Error>(())
//! ```

mod cache;
mod compressor;
mod error;
mod images;
mod import;

pub use cache::{CacheKey, ContentCache, PIPELINE_VERSION, table_fingerprint};
pub use compressor::{CompressOptions, Compressed, Compressor};
pub use error::{Error, Result};
pub use images::{embed_images, mime_from_extension};
pub use import::inline_imports;

pub use vendorize_config::ResolvedConfig;
pub use vendorize_minify::minify;
pub use vendorize_prefix::{PrefixEntry, PrefixTable, default_table, expand};
