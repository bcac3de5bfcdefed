//! Configuration file discovery and parsing
//!
//! Searches for `.config/vendorize.yaml` walking up from the current
//! directory. The project root is the parent of `.config/`.

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, WrapErr, eyre};
use facet::Facet;
use std::env;
use vendorize_prefix::{PrefixEntry, PrefixTable, default_table};

const CONFIG_DIR: &str = ".config";
const CONFIG_FILE_YAML: &str = "vendorize.yaml";

/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".cache/vendorize";

/// Vendorize configuration from `.config/vendorize.yaml`
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "snake_case")]
pub struct VendorizeConfig {
    /// Reuse earlier results for identical input. Default: true
    #[facet(default)]
    pub cache: Option<bool>,

    /// Where cached results live (relative to project root)
    #[facet(default)]
    pub cache_dir: Option<String>,

    /// Run the minifier after prefixing. Default: true
    #[facet(default)]
    pub minify: Option<bool>,

    /// Replace `@import url(...)` directives with the imported files. Default: true
    #[facet(default)]
    pub inline_imports: Option<bool>,

    /// Turn local background images into data URIs. Default: true
    #[facet(default)]
    pub embed_images: Option<bool>,

    /// Changes to the prefix table
    #[facet(default)]
    pub prefixes: Option<PrefixConfig>,
}

/// Prefix table customization
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "snake_case")]
pub struct PrefixConfig {
    /// Start from an empty table instead of the built-in one
    #[facet(default)]
    pub replace_defaults: Option<bool>,

    /// Entries to add, or to replace when the name already exists
    #[facet(default)]
    pub entries: Option<Vec<PrefixOverride>>,
}

/// One table entry as written in the config file
#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "snake_case")]
pub struct PrefixOverride {
    /// Bare name (e.g. `mask-image`)
    pub name: String,
    /// Prefixes in emission order, ending with `""`
    pub prefixes: Vec<String>,
}

/// Configuration with defaults applied and paths resolved
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Project root (parent of .config/), or the directory the defaults were
    /// resolved against
    pub root: Utf8PathBuf,
    pub cache: bool,
    /// Absolute path to the cache directory
    pub cache_dir: Utf8PathBuf,
    pub minify: bool,
    pub inline_imports: bool,
    pub embed_images: bool,
    /// The prefix table to expand with
    pub table: PrefixTable,
}

impl ResolvedConfig {
    /// Discover and load configuration from the current directory
    pub fn discover() -> Result<Option<Self>> {
        match find_config_file()? {
            Some(path) => Ok(Some(load_config(&path)?)),
            None => Ok(None),
        }
    }

    /// Load configuration from a specific project path, without walking up
    pub fn discover_from(project_path: &Utf8Path) -> Result<Option<Self>> {
        let yaml_file = project_path.join(CONFIG_DIR).join(CONFIG_FILE_YAML);
        if yaml_file.exists() {
            Ok(Some(load_config(&yaml_file)?))
        } else {
            Ok(None)
        }
    }

    /// Load a config file by path
    pub fn load(config_path: &Utf8Path) -> Result<Self> {
        load_config(config_path)
    }

    /// Defaults, rooted at `root`
    pub fn defaults(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
            cache: true,
            cache_dir: root.join(DEFAULT_CACHE_DIR),
            minify: true,
            inline_imports: true,
            embed_images: true,
            table: default_table().clone(),
        }
    }

    /// Apply a parsed config on top of the defaults
    pub fn resolve(config: VendorizeConfig, root: &Utf8Path) -> Result<Self> {
        let defaults = Self::defaults(root);

        let cache_dir = config
            .cache_dir
            .map(|dir| root.join(dir))
            .unwrap_or(defaults.cache_dir);

        let table = match config.prefixes {
            Some(prefixes) => build_table(prefixes)?,
            None => defaults.table,
        };

        Ok(Self {
            root: root.to_owned(),
            cache: config.cache.unwrap_or(defaults.cache),
            cache_dir,
            minify: config.minify.unwrap_or(defaults.minify),
            inline_imports: config.inline_imports.unwrap_or(defaults.inline_imports),
            embed_images: config.embed_images.unwrap_or(defaults.embed_images),
            table,
        })
    }
}

fn build_table(config: PrefixConfig) -> Result<PrefixTable> {
    let entries = config
        .entries
        .unwrap_or_default()
        .into_iter()
        .map(|e| {
            PrefixEntry::new(e.name.clone(), e.prefixes)
                .wrap_err_with(|| format!("invalid prefix entry '{}'", e.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let table = if config.replace_defaults.unwrap_or(false) {
        PrefixTable::new(entries)?
    } else {
        default_table().with_overrides(entries)?
    };

    if table.is_empty() {
        return Err(eyre!(
            "prefix table is empty: `replace_defaults` is set but no entries are listed"
        ));
    }
    Ok(table)
}

/// Search for `.config/vendorize.yaml` walking up from current directory
fn find_config_file() -> Result<Option<Utf8PathBuf>> {
    let cwd = env::current_dir()?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
        eyre!(
            "Current directory is not valid UTF-8: {}",
            e.as_path().display()
        )
    })?;

    let mut current = cwd.as_path();
    loop {
        let yaml_file = current.join(CONFIG_DIR).join(CONFIG_FILE_YAML);
        if yaml_file.exists() {
            return Ok(Some(yaml_file));
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    }
}

fn load_config(config_path: &Utf8Path) -> Result<ResolvedConfig> {
    let content = fs_err::read_to_string(config_path)?;

    let config: VendorizeConfig = facet_yaml::from_str(&content)
        .map_err(|e| eyre!("Failed to parse {}: {}", config_path, e))?;

    // Project root is the parent of .config/; a file passed explicitly from
    // elsewhere is resolved against its own directory.
    let config_dir = config_path
        .parent()
        .ok_or_else(|| eyre!("Config file has no parent directory"))?;
    let root = if config_dir.file_name() == Some(CONFIG_DIR) {
        config_dir
            .parent()
            .ok_or_else(|| eyre!(".config directory has no parent"))?
    } else {
        config_dir
    };

    tracing::debug!(path = %config_path, root = %root, "loaded config");
    ResolvedConfig::resolve(config, root)
}
