//! The prefix compatibility table
//!
//! Maps a bare property, at-rule or pseudo-element name to the ordered list
//! of vendor prefixes it should be emitted with. The list always ends with
//! the empty prefix, so the unprefixed declaration comes last.
//!
//! Iteration order is significant: the engine rewrites the stylesheet
//! textually, so entries processed later see the output of earlier ones.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Error, Result};

/// Characters allowed inside an at-rule span (header and block).
pub(crate) const AT_RULE_BODY: &str = r#"[A-Za-z0-9_\s{}\-;:."'%()*#,/!+=]"#;

/// First character of a selector that carries a pseudo-element.
const PSEUDO_START: &str = r#"[A-Za-z0-9_\-\[\]"'=:.#*>+~^$|()]"#;

/// Characters allowed in the rest of the selector list before the name.
const PSEUDO_LEAD: &str = r#"[A-Za-z0-9_\-\[\]"'=:.#*>+~^$|()\s,]"#;

/// Character that ends a pseudo-element name inside a selector.
const PSEUDO_END: &str = r"[\s{,:.#>+~()\[]";

/// Characters allowed between a pseudo-element name and the closing brace.
const PSEUDO_BODY: &str = r#"[A-Za-z0-9_\s{\-;:."'%()*#,/!+>~^$|=\[\]]"#;

/// One row of the table: a bare name and its prefixes.
#[derive(Debug, Clone)]
pub struct PrefixEntry {
    name: String,
    prefixes: Vec<String>,
    patterns: EntryPatterns,
}

/// Patterns compiled once per entry and shared by every run.
#[derive(Debug, Clone)]
pub(crate) struct EntryPatterns {
    /// `name: value;` or `property: name...;`
    pub declaration: Regex,
    /// `@name` followed by its header and block
    pub at_rule: Regex,
    /// `selector::name ... }`, starting at the first selector of the list
    pub pseudo: Regex,
}

impl EntryPatterns {
    fn compile(name: &str) -> Result<Self> {
        let name = regex::escape(name);
        Ok(Self {
            declaration: Regex::new(&format!(
                r"(?P<property>{name}\s*:[^;{{}}]*;)|(?P<value>[A-Za-z\-]+\s*:\s*{name}[^;{{}}]*;)"
            ))?,
            at_rule: Regex::new(&format!(r"@{name}{AT_RULE_BODY}*"))?,
            pseudo: Regex::new(&format!(
                r"{PSEUDO_START}{PSEUDO_LEAD}*:{name}{PSEUDO_END}{PSEUDO_BODY}*\}}"
            ))?,
        })
    }
}

impl PrefixEntry {
    /// Create an entry, validating the name and prefix list.
    pub fn new<I, S>(name: impl Into<String>, prefixes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        if name.contains(|c: char| c.is_whitespace() || c == '@' || c == ':') {
            return Err(Error::InvalidName { name });
        }

        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        match prefixes.last() {
            None => return Err(Error::EmptyPrefixes { name }),
            Some(last) if !last.is_empty() => return Err(Error::MissingUnprefixed { name }),
            Some(_) => {}
        }

        let patterns = EntryPatterns::compile(&name)?;
        Ok(Self {
            name,
            prefixes,
            patterns,
        })
    }

    /// The bare (unprefixed) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefixes in emission order, ending with `""`.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub(crate) fn patterns(&self) -> &EntryPatterns {
        &self.patterns
    }
}

/// An ordered, read-only collection of [`PrefixEntry`] values.
///
/// Tables are immutable once built and can be shared freely between
/// threads; a compression run only ever reads from one.
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    entries: IndexMap<String, PrefixEntry>,
}

impl PrefixTable {
    /// Build a table from entries in declared order.
    ///
    /// Fails if two entries share a name. An empty table is accepted here
    /// and rejected when it is used for expansion.
    pub fn new(entries: impl IntoIterator<Item = PrefixEntry>) -> Result<Self> {
        let mut map = IndexMap::new();
        for entry in entries {
            if map.contains_key(entry.name()) {
                return Err(Error::DuplicateEntry { name: entry.name });
            }
            map.insert(entry.name.clone(), entry);
        }
        Ok(Self { entries: map })
    }

    /// Build a table from `(name, prefixes)` pairs.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
    ) -> Result<Self> {
        let entries = pairs
            .into_iter()
            .map(|(name, prefixes)| PrefixEntry::new(name, prefixes.iter().copied()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(entries)
    }

    /// Derive a new table with `overrides` applied.
    ///
    /// An override for an existing name keeps that entry's position; new
    /// names are appended in the order given. `self` is left untouched.
    pub fn with_overrides(&self, overrides: impl IntoIterator<Item = PrefixEntry>) -> Result<Self> {
        let mut entries = self.entries.clone();
        let mut seen = Vec::new();
        for entry in overrides {
            if seen.contains(&entry.name) {
                return Err(Error::DuplicateEntry { name: entry.name });
            }
            seen.push(entry.name.clone());
            entries.insert(entry.name.clone(), entry);
        }
        Ok(Self { entries })
    }

    /// Look up an entry by bare name.
    pub fn get(&self, name: &str) -> Option<&PrefixEntry> {
        self.entries.get(name)
    }

    /// Entries in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &PrefixEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a PrefixTable {
    type Item = &'a PrefixEntry;
    type IntoIter = indexmap::map::Values<'a, String, PrefixEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

const WEBKIT: &[&str] = &["-webkit-", ""];
const MOZ: &[&str] = &["-moz-", ""];
const WEBKIT_MOZ: &[&str] = &["-webkit-", "-moz-", ""];
const WEBKIT_MOZ_O: &[&str] = &["-webkit-", "-moz-", "-o-", ""];
const WEBKIT_MOZ_MS: &[&str] = &["-webkit-", "-moz-", "-ms-", ""];
const WEBKIT_KHTML_MOZ: &[&str] = &["-webkit-", "-khtml-", "-moz-", ""];

/// The built-in table. Not exhaustive, but covers the properties that
/// most commonly need prefixes.
pub const DEFAULT_PREFIXES: &[(&str, &[&str])] = &[
    ("align-content", WEBKIT),
    ("align-items", WEBKIT),
    ("align-self", WEBKIT),
    ("animation", WEBKIT_MOZ_O),
    ("animation-delay", WEBKIT_MOZ_O),
    ("animation-direction", WEBKIT_MOZ_O),
    ("animation-duration", WEBKIT_MOZ_O),
    ("animation-fill-mode", WEBKIT_MOZ_O),
    ("animation-iteration-count", WEBKIT_MOZ_O),
    ("animation-name", WEBKIT_MOZ_O),
    ("animation-play-state", WEBKIT_MOZ_O),
    ("animation-timing-function", WEBKIT_MOZ_O),
    ("backface-visibility", WEBKIT_MOZ_MS),
    ("background-clip", MOZ),
    ("background-origin", WEBKIT_MOZ_O),
    ("background-size", WEBKIT_MOZ_O),
    ("border-image", WEBKIT_MOZ_O),
    ("border-image-outset", WEBKIT_MOZ_O),
    ("border-image-repeat", WEBKIT_MOZ_O),
    ("border-image-source", WEBKIT_MOZ_O),
    ("border-image-width", WEBKIT_MOZ_O),
    ("border-radius", WEBKIT_KHTML_MOZ),
    ("border-top-left-radius", WEBKIT_KHTML_MOZ),
    ("border-top-right-radius", WEBKIT_KHTML_MOZ),
    ("border-bottom-right-radius", WEBKIT_KHTML_MOZ),
    ("border-bottom-left-radius", WEBKIT_KHTML_MOZ),
    ("border-radius-topleft", WEBKIT_KHTML_MOZ),
    ("border-radius-topright", WEBKIT_KHTML_MOZ),
    ("border-radius-bottomright", WEBKIT_KHTML_MOZ),
    ("border-radius-bottomleft", WEBKIT_KHTML_MOZ),
    ("box-align", WEBKIT_MOZ_MS),
    ("box-direction", WEBKIT_MOZ_MS),
    ("box-flex", WEBKIT_MOZ_MS),
    ("box-flex-group", WEBKIT_MOZ),
    ("box-lines", WEBKIT_MOZ_MS),
    ("box-ordinal-group", WEBKIT_MOZ_MS),
    ("box-orient", WEBKIT_MOZ_MS),
    ("box-pack", WEBKIT_MOZ_MS),
    ("box-shadow", WEBKIT_MOZ),
    ("box-sizing", WEBKIT_MOZ),
    ("calc", WEBKIT),
    ("column-count", WEBKIT_MOZ),
    ("column-fill", MOZ),
    ("column-gap", WEBKIT_MOZ),
    ("column-rule", WEBKIT_MOZ),
    ("column-rule-color", WEBKIT_MOZ),
    ("column-rule-style", WEBKIT_MOZ),
    ("column-rule-width", WEBKIT_MOZ),
    ("column-span", WEBKIT),
    ("column-width", WEBKIT_MOZ),
    ("columns", WEBKIT_MOZ),
    ("filter", WEBKIT),
    ("flex-basis", WEBKIT),
    ("flex-direction", WEBKIT),
    ("fullscreen", WEBKIT_MOZ_MS),
    ("hyphens", WEBKIT_MOZ_MS),
    ("image-rendering", WEBKIT_MOZ_O),
    ("object-fit", &["-o-", ""]),
    ("opacity", &["-khtml-", "-moz-", ""]),
    ("orient", MOZ),
    ("perspective", WEBKIT_MOZ),
    ("perspective-origin", WEBKIT_MOZ),
    ("tab-size", &["-moz-", "-o-", ""]),
    ("text-align-last", MOZ),
    ("text-decoration-color", WEBKIT_MOZ),
    ("text-decoration-line", MOZ),
    ("text-decoration-style", MOZ),
    ("text-overflow", &["-ms-", "-o-", ""]),
    ("transform", &["-webkit-", "-moz-", "-ms-", "-o-", ""]),
    ("transform-origin", &["-webkit-", "-moz-", "-ms-", "-o-", ""]),
    ("transform-style", WEBKIT_MOZ),
    ("transition", WEBKIT_MOZ_O),
    ("transition-delay", WEBKIT_MOZ_O),
    ("transition-duration", WEBKIT_MOZ_O),
    ("transition-property", WEBKIT_MOZ_O),
    ("transition-timing-function", WEBKIT_MOZ_O),
    ("linear-gradient", WEBKIT_MOZ_O),
    ("radial-gradient", WEBKIT_MOZ_O),
    ("repeating-linear-gradient", WEBKIT_MOZ_O),
    ("repeating-radial-gradient", WEBKIT_MOZ_O),
    ("user-modify", WEBKIT_MOZ),
    ("user-select", WEBKIT_MOZ_MS),
    ("viewport", &["-ms-", ""]),
    ("writing-mode", WEBKIT),
    ("document", MOZ),
    ("keyframes", WEBKIT_MOZ_O),
    ("placeholder", &["-webkit-input-", "-moz-", "-ms-input-", ""]),
    ("selection", MOZ),
];

static DEFAULT_TABLE: OnceLock<PrefixTable> = OnceLock::new();

/// The process-wide built-in table.
pub fn default_table() -> &'static PrefixTable {
    DEFAULT_TABLE.get_or_init(|| {
        PrefixTable::from_pairs(DEFAULT_PREFIXES.iter().copied())
            .expect("built-in prefix table is well-formed")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let table = default_table();
        assert_eq!(table.len(), DEFAULT_PREFIXES.len());

        let names: Vec<_> = table.iter().map(|e| e.name()).collect();
        let expected: Vec<_> = DEFAULT_PREFIXES.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, expected);

        for entry in table {
            assert_eq!(entry.prefixes().last().map(String::as_str), Some(""));
        }
    }

    #[test]
    fn test_lookup() {
        let table = default_table();
        let opacity = table.get("opacity").unwrap();
        assert_eq!(opacity.prefixes(), ["-khtml-", "-moz-", ""]);
        assert!(table.get("color").is_none());
    }

    #[test]
    fn test_entry_validation() {
        assert!(matches!(
            PrefixEntry::new("", [""]),
            Err(Error::EmptyName)
        ));
        assert!(matches!(
            PrefixEntry::new("@keyframes", [""]),
            Err(Error::InvalidName { .. })
        ));
        assert!(matches!(
            PrefixEntry::new("opacity", Vec::<String>::new()),
            Err(Error::EmptyPrefixes { .. })
        ));
        assert!(matches!(
            PrefixEntry::new("opacity", ["", "-moz-"]),
            Err(Error::MissingUnprefixed { .. })
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = PrefixTable::from_pairs([
            ("opacity", &["-moz-", ""][..]),
            ("opacity", &[""][..]),
        ]);
        assert!(matches!(result, Err(Error::DuplicateEntry { name }) if name == "opacity"));
    }

    #[test]
    fn test_overrides_keep_position() {
        let base = PrefixTable::from_pairs([
            ("opacity", &["-moz-", ""][..]),
            ("filter", &["-webkit-", ""][..]),
        ])
        .unwrap();

        let derived = base
            .with_overrides([
                PrefixEntry::new("opacity", [""]).unwrap(),
                PrefixEntry::new("mask-image", ["-webkit-", ""]).unwrap(),
            ])
            .unwrap();

        let names: Vec<_> = derived.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["opacity", "filter", "mask-image"]);
        assert_eq!(derived.get("opacity").unwrap().prefixes(), [""]);

        // the base table is untouched
        assert_eq!(base.get("opacity").unwrap().prefixes(), ["-moz-", ""]);
        assert_eq!(base.len(), 2);
    }
}
