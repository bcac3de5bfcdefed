//! Driving the table over a stylesheet
//!
//! A run strips comments, filters the table down to the entries present in
//! the stylesheet, then rewrites the buffer one entry at a time: plain
//! declarations first, then at-rules, then pseudo-elements, each group in
//! table order. Every step reads the buffer left by the previous one.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::expander::PrefixExpander;
use crate::scanner::{DeclarationScanner, OccurrenceClass};
use crate::table::{PrefixEntry, PrefixTable};

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("comment pattern compiles"));

/// Order in which the classes are processed.
const PASSES: [OccurrenceClass; 3] = [
    OccurrenceClass::PlainProperty,
    OccurrenceClass::AtRule,
    OccurrenceClass::PseudoElement,
];

/// An entry found in the current stylesheet, with the class it takes there.
#[derive(Debug, Clone, Copy)]
pub struct ViewEntry<'t> {
    pub entry: &'t PrefixEntry,
    pub class: OccurrenceClass,
}

/// The entries of a table that are present in one stylesheet.
///
/// Built per run; the table itself is never modified.
#[derive(Debug, Default)]
pub struct FilteredView<'t> {
    entries: Vec<ViewEntry<'t>>,
}

impl<'t> FilteredView<'t> {
    /// Run the presence check for every entry of `table` against `buffer`.
    pub fn new(table: &'t PrefixTable, buffer: &str) -> Self {
        let entries = table
            .iter()
            .filter_map(|entry| {
                let presence = DeclarationScanner::new(entry).presence(buffer)?;
                Some(ViewEntry {
                    entry,
                    class: presence.class,
                })
            })
            .collect();
        Self { entries }
    }

    /// Entries of one class, in table order.
    pub fn of_class(&self, class: OccurrenceClass) -> impl Iterator<Item = &ViewEntry<'t>> {
        self.entries.iter().filter(move |v| v.class == class)
    }

    pub fn names(&self) -> impl Iterator<Item = &'t str> + '_ {
        self.entries.iter().map(|v| v.entry.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters for one run, mostly useful for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExpandStats {
    /// Entries that survived the presence check.
    pub present: usize,
    /// Occurrences rewritten.
    pub expanded: usize,
    /// Spans left untouched because they could not be delimited.
    pub malformed: usize,
}

/// Applies a [`PrefixTable`] to stylesheets.
#[derive(Debug, Clone, Copy)]
pub struct PrefixEngine<'t> {
    table: &'t PrefixTable,
}

impl<'t> PrefixEngine<'t> {
    /// Create an engine over `table`. Fails if the table is empty.
    pub fn new(table: &'t PrefixTable) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::EmptyTable);
        }
        Ok(Self { table })
    }

    /// Prefix `stylesheet`, returning the rewritten text.
    pub fn run(&self, stylesheet: &str) -> String {
        self.run_with_stats(stylesheet).0
    }

    /// Prefix `stylesheet` and report what happened.
    pub fn run_with_stats(&self, stylesheet: &str) -> (String, ExpandStats) {
        let mut buffer = strip_comments(stylesheet);
        let view = FilteredView::new(self.table, &buffer);
        let mut stats = ExpandStats {
            present: view.len(),
            ..ExpandStats::default()
        };

        tracing::debug!(
            present = view.len(),
            entries = ?view.names().collect::<Vec<_>>(),
            "filtered prefix table"
        );

        for class in PASSES {
            for item in view.of_class(class) {
                if let Some(rewritten) = apply_entry(item, &buffer, &mut stats) {
                    buffer = rewritten;
                }
            }
        }

        (buffer, stats)
    }
}

/// Rewrite every occurrence of one entry. Returns `None` when there is
/// nothing to change, leaving the caller's buffer as it was.
fn apply_entry(item: &ViewEntry<'_>, buffer: &str, stats: &mut ExpandStats) -> Option<String> {
    let name = item.entry.name();
    let scan = DeclarationScanner::new(item.entry).scan(buffer, item.class);

    for span in &scan.malformed {
        tracing::debug!(
            name,
            class = item.class.as_str(),
            start = span.start,
            end = span.end,
            "leaving unbalanced span untouched"
        );
    }
    stats.malformed += scan.malformed.len();

    if scan.occurrences.is_empty() {
        tracing::debug!(name, class = item.class.as_str(), "no occurrences");
        return None;
    }

    let expander = PrefixExpander::new(item.entry);
    let mut out = String::with_capacity(buffer.len() * 2);
    let mut cursor = 0;
    for occurrence in &scan.occurrences {
        out.push_str(&buffer[cursor..occurrence.span.start]);
        out.push_str(&expander.expand(occurrence));
        cursor = occurrence.span.end;
    }
    out.push_str(&buffer[cursor..]);

    tracing::debug!(
        name,
        class = item.class.as_str(),
        occurrences = scan.occurrences.len(),
        "expanded"
    );
    stats.expanded += scan.occurrences.len();

    Some(out)
}

/// Remove every `/* ... */` comment.
pub fn strip_comments(css: &str) -> String {
    COMMENT.replace_all(css, "").into_owned()
}

/// Prefix `stylesheet` with `table`.
///
/// Call this exactly once per raw stylesheet: running it on its own output
/// adds the prefixes again.
pub fn expand(stylesheet: &str, table: &PrefixTable) -> Result<String> {
    Ok(PrefixEngine::new(table)?.run(stylesheet))
}
