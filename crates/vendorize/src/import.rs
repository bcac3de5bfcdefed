//! `@import url(...)` inlining
//!
//! Every recognized directive is removed and the imported files are placed
//! in front of the stylesheet, in the order the directives appeared. Imports
//! are not followed recursively.

use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;

use crate::error::{Error, Result};

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import url\(([\w'"/.\-]*)\);"#).expect("import pattern compiles")
});

/// Inline the imports of a stylesheet located in `base_dir`.
///
/// `source` is the stylesheet's own path when known; an import resolving to
/// it is dropped with a warning instead of duplicating the file.
pub fn inline_imports(css: &str, base_dir: &Utf8Path, source: Option<&Utf8Path>) -> Result<String> {
    let targets: Vec<&str> = IMPORT
        .captures_iter(css)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    if targets.is_empty() {
        return Ok(css.to_string());
    }

    let mut out = String::new();
    for target in targets {
        let path = resolve(base_dir, target);
        if source.is_some_and(|s| s == path) {
            tracing::warn!(%path, "stylesheet imports itself, skipping");
            continue;
        }

        let imported = fs_err::read_to_string(&path).map_err(|source| Error::Import {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(%path, bytes = imported.len(), "inlined import");
        out.push_str(&imported);
        out.push('\n');
    }

    out.push_str(&IMPORT.replace_all(css, ""));
    Ok(out)
}

fn resolve(base_dir: &Utf8Path, target: &str) -> Utf8PathBuf {
    let relative = target.trim_matches(|c| c == '"' || c == '\'');
    base_dir.join(relative)
}
