//! The full compression pipeline
//!
//! read → strip comments → inline imports → embed images → cache lookup →
//! prefix → minify → cache store

use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use vendorize_config::ResolvedConfig;
use vendorize_prefix::{ExpandStats, PrefixEngine, PrefixTable, default_table, strip_comments};

use crate::cache::{CacheKey, ContentCache};
use crate::error::{Error, Result};
use crate::import::inline_imports;
use crate::images::embed_images;

/// Which pipeline stages run.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub minify: bool,
    pub inline_imports: bool,
    pub embed_images: bool,
    /// Where to cache results; `None` disables caching.
    pub cache_dir: Option<Utf8PathBuf>,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            minify: true,
            inline_imports: true,
            embed_images: true,
            cache_dir: None,
        }
    }
}

impl From<&ResolvedConfig> for CompressOptions {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            minify: config.minify,
            inline_imports: config.inline_imports,
            embed_images: config.embed_images,
            cache_dir: config.cache.then(|| config.cache_dir.clone()),
        }
    }
}

/// Result of compressing one stylesheet.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub css: String,
    /// The result was read from the cache; `stats` is `None` in that case.
    pub cache_hit: bool,
    pub stats: Option<ExpandStats>,
}

/// Runs the pipeline with one table and one set of options.
#[derive(Debug, Clone)]
pub struct Compressor {
    table: PrefixTable,
    options: CompressOptions,
    cache: Option<ContentCache>,
}

impl Compressor {
    /// Create a compressor. Fails if `table` is empty.
    pub fn new(table: PrefixTable, options: CompressOptions) -> Result<Self> {
        PrefixEngine::new(&table)?;
        let cache = options.cache_dir.clone().map(ContentCache::new);
        Ok(Self {
            table,
            options,
            cache,
        })
    }

    /// The built-in table with default options and no cache.
    pub fn with_defaults() -> Result<Self> {
        Self::new(default_table().clone(), CompressOptions::default())
    }

    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        Self::new(config.table.clone(), CompressOptions::from(config))
    }

    pub fn table(&self) -> &PrefixTable {
        &self.table
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    /// Compress the stylesheet at `path`. Imports and images are resolved
    /// relative to its directory.
    pub fn compress_file(&self, path: &Utf8Path) -> Result<Compressed> {
        let css = fs_err::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or(Utf8Path::new("."));

        let out = self.run(&css, base_dir, Some(path))?;
        tracing::info!(
            %path,
            input = css.len(),
            output = out.css.len(),
            cache_hit = out.cache_hit,
            "compressed"
        );
        Ok(out)
    }

    /// [`Compressor::compress_file`] for a path that may not be UTF-8.
    pub fn compress_path(&self, path: &Path) -> Result<Compressed> {
        let path = Utf8Path::from_path(path).ok_or_else(|| Error::NonUtf8Path(path.to_owned()))?;
        self.compress_file(path)
    }

    /// Compress in-memory stylesheet text. Imports and images are resolved
    /// relative to `base_dir`.
    pub fn compress_str(&self, css: &str, base_dir: &Utf8Path) -> Result<Compressed> {
        self.run(css, base_dir, None)
    }

    fn run(
        &self,
        css: &str,
        base_dir: &Utf8Path,
        source: Option<&Utf8Path>,
    ) -> Result<Compressed> {
        // commented-out imports and images are never fetched
        let mut resolved = strip_comments(css);
        if self.options.inline_imports {
            resolved = strip_comments(&inline_imports(&resolved, base_dir, source)?);
        }
        if self.options.embed_images {
            resolved = embed_images(&resolved, base_dir)?;
        }

        let key = CacheKey::compute(&resolved, &self.table, self.options.minify);
        if let Some(cache) = &self.cache
            && let Some(css) = cache.get(key)?
        {
            return Ok(Compressed {
                css,
                cache_hit: true,
                stats: None,
            });
        }

        let (prefixed, stats) = PrefixEngine::new(&self.table)?.run_with_stats(&resolved);
        tracing::debug!(
            present = stats.present,
            expanded = stats.expanded,
            malformed = stats.malformed,
            "prefixed"
        );

        let css = if self.options.minify {
            vendorize_minify::minify(&prefixed)
        } else {
            prefixed
        };

        if let Some(cache) = &self.cache {
            cache.put(key, &css)?;
        }

        Ok(Compressed {
            css,
            cache_hit: false,
            stats: Some(stats),
        })
    }
}
