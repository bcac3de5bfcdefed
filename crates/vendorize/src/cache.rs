//! On-disk result cache
//!
//! Compressed output is stored as `<cache_dir>/<key>.css`. The key hashes
//! everything the output depends on, so a stale entry is never read back:
//! changing the input text, the prefix table or the options yields a
//! different file.

use std::fmt;
use std::hash::Hasher;
use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use rapidhash::fast::RapidHasher;
use vendorize_prefix::PrefixTable;

use crate::error::{Error, Result};

/// Bump this when pipeline output changes for the same input.
pub const PIPELINE_VERSION: u64 = 1;

/// Content hash identifying one cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Key for `css` (after imports and images are resolved) compressed with
    /// `table`, with or without minification.
    pub fn compute(css: &str, table: &PrefixTable, minify: bool) -> Self {
        let mut hasher = RapidHasher::default();
        hasher.write(&PIPELINE_VERSION.to_le_bytes());
        hasher.write_u8(minify as u8);
        hasher.write(&table_fingerprint(table).to_le_bytes());
        hasher.write(css.as_bytes());
        Self(hasher.finish())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Hash of a table's names and prefixes, in order.
pub fn table_fingerprint(table: &PrefixTable) -> u64 {
    let mut hasher = RapidHasher::default();
    for entry in table {
        hasher.write(entry.name().as_bytes());
        hasher.write_u8(0xff);
        for prefix in entry.prefixes() {
            hasher.write(prefix.as_bytes());
            hasher.write_u8(0);
        }
    }
    hasher.finish()
}

/// A directory of cached results.
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: Utf8PathBuf,
}

impl ContentCache {
    /// Cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn path_for(&self, key: CacheKey) -> Utf8PathBuf {
        self.dir.join(format!("{key}.css"))
    }

    /// Read a cached result, if there is one.
    pub fn get(&self, key: CacheKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs_err::read_to_string(&path) {
            Ok(css) => {
                tracing::debug!(%key, "cache hit");
                Ok(Some(css))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(%key, "cache miss");
                Ok(None)
            }
            Err(source) => Err(Error::Cache { path, source }),
        }
    }

    /// Store a result. Writes go through a temporary file so readers never
    /// see a partial entry.
    pub fn put(&self, key: CacheKey, css: &str) -> Result<()> {
        fs_err::create_dir_all(&self.dir).map_err(cache_err(&self.dir))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("css.tmp");
        fs_err::write(&tmp, css).map_err(cache_err(&tmp))?;
        fs_err::rename(&tmp, &path).map_err(cache_err(&path))?;

        tracing::debug!(%key, bytes = css.len(), "cache store");
        Ok(())
    }
}

fn cache_err(path: &Utf8Path) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.to_owned();
    move |source| Error::Cache { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &[&str])]) -> PrefixTable {
        PrefixTable::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_key_format() {
        let t = table(&[("opacity", &["-moz-", ""])]);
        let key = CacheKey::compute(".a{}", &t, true).to_string();
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_depends_on_inputs() {
        let t = table(&[("opacity", &["-moz-", ""])]);
        let other = table(&[("opacity", &["-webkit-", ""])]);
        let base = CacheKey::compute(".a{}", &t, true);

        assert_eq!(base, CacheKey::compute(".a{}", &t, true));
        assert_ne!(base, CacheKey::compute(".b{}", &t, true));
        assert_ne!(base, CacheKey::compute(".a{}", &t, false));
        assert_ne!(base, CacheKey::compute(".a{}", &other, true));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let ab = table(&[("a", &[""]), ("b", &[""])]);
        let ba = table(&[("b", &[""]), ("a", &[""])]);
        assert_ne!(table_fingerprint(&ab), table_fingerprint(&ba));
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let cache = ContentCache::new(root.join("nested/cache"));
        let key = CacheKey(0xdead_beef);

        assert_eq!(cache.get(key).unwrap(), None);
        cache.put(key, ".a{}").unwrap();
        assert_eq!(cache.get(key).unwrap().as_deref(), Some(".a{}"));
        assert!(cache.path_for(key).ends_with("00000000deadbeef.css"));
    }
}
