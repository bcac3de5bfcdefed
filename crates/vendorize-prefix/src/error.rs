//! Error types for prefix tables and expansion.

/// Errors reported to callers of the prefix engine.
///
/// Only configuration problems surface here. A span that cannot be
/// expanded is skipped by the engine and never becomes an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Expansion was requested with a table that has no entries.
    #[error("prefix table is empty")]
    EmptyTable,

    /// An entry was declared with an empty name.
    #[error("prefix entry has an empty name")]
    EmptyName,

    /// An entry name contains characters that cannot appear in a bare name.
    #[error("invalid bare name {name:?}: names may not contain whitespace, '@' or ':'")]
    InvalidName { name: String },

    /// An entry was declared without any prefixes.
    #[error("prefix entry '{name}' has no prefixes")]
    EmptyPrefixes { name: String },

    /// An entry's prefix list does not end with the unprefixed form.
    #[error("prefix entry '{name}' must list the unprefixed form (\"\") last")]
    MissingUnprefixed { name: String },

    /// Two entries share the same bare name.
    #[error("prefix entry '{name}' is declared more than once")]
    DuplicateEntry { name: String },

    /// A matching pattern failed to compile.
    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
