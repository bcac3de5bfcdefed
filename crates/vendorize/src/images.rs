//! Background image embedding
//!
//! `url(...)` references inside `background` and `background-image`
//! declarations are replaced by base64 data URIs. Only local relative paths
//! are embedded; remote, protocol-relative, root-relative and `data:` URLs
//! are left as they are.

use std::sync::LazyLock;

use base64::Engine;
use camino::Utf8Path;
use regex::Regex;

use crate::error::{Error, Result};

static BACKGROUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"background(?:-image)?\s*:[^;{}]*").expect("background pattern compiles")
});

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([\w/.\-]+)['"]?\s*\)"#).expect("url pattern compiles")
});

/// Embed every local background image referenced from a stylesheet in `base_dir`.
pub fn embed_images(css: &str, base_dir: &Utf8Path) -> Result<String> {
    let mut out = String::new();
    let mut cursor = 0;

    for decl in BACKGROUND.find_iter(css) {
        for caps in IMAGE_URL.captures_iter(decl.as_str()) {
            let (Some(whole), Some(url)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let target = url.as_str();
            if target.starts_with('/') {
                tracing::debug!(url = target, "not embedding root-relative url");
                continue;
            }

            let uri = data_uri(base_dir, target)?;
            out.push_str(&css[cursor..decl.start() + whole.start()]);
            out.push_str("url(");
            out.push_str(&uri);
            out.push(')');
            cursor = decl.start() + whole.end();
        }
    }

    if cursor == 0 {
        return Ok(css.to_string());
    }
    out.push_str(&css[cursor..]);
    Ok(out)
}

fn data_uri(base_dir: &Utf8Path, target: &str) -> Result<String> {
    let path = base_dir.join(target);
    let bytes = fs_err::read(&path).map_err(|source| Error::Asset {
        path: path.clone(),
        source,
    })?;
    let mime = mime_from_extension(&path);
    tracing::debug!(%path, mime, bytes = bytes.len(), "embedded image");

    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

/// MIME type for an image, from its lowercased extension.
pub fn mime_from_extension(path: &Utf8Path) -> String {
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some("svg") => "image/svg+xml".to_string(),
        Some("ico") => "image/x-icon".to_string(),
        Some("") | None => "application/octet-stream".to_string(),
        Some(ext) => format!("image/{ext}"),
    }
}
