//! Locating table entries in stylesheet text
//!
//! The scanner never tokenizes. It decides from the text around the first
//! usable occurrence of a name which of three shapes the entry takes in this
//! stylesheet, then collects every span of that shape with the entry's
//! precompiled patterns.

use std::ops::Range;

use crate::table::PrefixEntry;

/// Which matching mode found an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceClass {
    /// `name: value;` or `property: name...;`
    PlainProperty,
    /// `@name ... { ... }`
    AtRule,
    /// `selector::name ... { ... }`
    PseudoElement,
}

impl OccurrenceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            OccurrenceClass::PlainProperty => "plain",
            OccurrenceClass::AtRule => "at-rule",
            OccurrenceClass::PseudoElement => "pseudo-element",
        }
    }
}

/// Where an entry was first seen, and what class that makes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    /// Byte offset of the name itself.
    pub offset: usize,
    pub class: OccurrenceClass,
}

/// A located span whose identity matches a table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence<'a> {
    /// Byte range of `matched_text` in the scanned buffer.
    pub span: Range<usize>,
    pub matched_text: &'a str,
    pub class: OccurrenceClass,
    pub bare_name: &'a str,
}

/// Spans collected for one entry in one pass.
#[derive(Debug, Default)]
pub struct Scan<'a> {
    /// Well-formed occurrences, left to right and non-overlapping.
    pub occurrences: Vec<Occurrence<'a>>,
    /// Spans that matched a pattern but could not be delimited. Left as-is.
    pub malformed: Vec<Range<usize>>,
}

/// Scans a buffer for a single [`PrefixEntry`].
pub struct DeclarationScanner<'t> {
    entry: &'t PrefixEntry,
}

impl<'t> DeclarationScanner<'t> {
    pub fn new(entry: &'t PrefixEntry) -> Self {
        Self { entry }
    }

    /// Find the first occurrence of the name that is not directly preceded
    /// by `-` (already prefixed) or `{` (glued to a selector brace).
    ///
    /// The preceding character picks the class: `@` means at-rule. `:` means
    /// pseudo-element, unless the text after the name reaches `;` or `}`
    /// before any `{`, in which case the name is a value token
    /// (`transition:opacity 1s`) and the class is plain.
    pub fn presence(&self, buffer: &str) -> Option<Presence> {
        let name = self.entry.name();
        buffer.match_indices(name).find_map(|(offset, _)| {
            let class = match buffer[..offset].chars().next_back() {
                Some('-' | '{') => return None,
                Some('@') => OccurrenceClass::AtRule,
                Some(':') if opens_block(&buffer[offset + name.len()..]) => {
                    OccurrenceClass::PseudoElement
                }
                _ => OccurrenceClass::PlainProperty,
            };
            Some(Presence { offset, class })
        })
    }

    /// Collect every span of the given class in `buffer`.
    pub fn scan<'b>(&self, buffer: &'b str, class: OccurrenceClass) -> Scan<'b>
    where
        't: 'b,
    {
        match class {
            OccurrenceClass::PlainProperty => self.scan_declarations(buffer),
            OccurrenceClass::AtRule => self.scan_at_rules(buffer),
            OccurrenceClass::PseudoElement => self.scan_pseudo_elements(buffer),
        }
    }

    fn occurrence<'b>(
        &self,
        buffer: &'b str,
        span: Range<usize>,
        class: OccurrenceClass,
    ) -> Occurrence<'b>
    where
        't: 'b,
    {
        Occurrence {
            matched_text: &buffer[span.clone()],
            span,
            class,
            bare_name: self.entry.name(),
        }
    }

    fn scan_declarations<'b>(&self, buffer: &'b str) -> Scan<'b>
    where
        't: 'b,
    {
        let pattern = &self.entry.patterns().declaration;
        let mut scan = Scan::default();
        let mut cursor = 0;

        while let Some(caps) = pattern.captures_at(buffer, cursor) {
            let Some(whole) = caps.get(0) else { break };

            // `backdrop-filter:` and `-webkit-filter:` must not match `filter`
            if caps.name("property").is_some() && follows_identifier(buffer, whole.start()) {
                cursor = next_char_boundary(buffer, whole.start());
                continue;
            }

            scan.occurrences.push(self.occurrence(
                buffer,
                whole.range(),
                OccurrenceClass::PlainProperty,
            ));
            cursor = whole.end();
        }

        scan
    }

    fn scan_at_rules<'b>(&self, buffer: &'b str) -> Scan<'b>
    where
        't: 'b,
    {
        let pattern = &self.entry.patterns().at_rule;
        let mut scan = Scan::default();
        let mut cursor = 0;

        while let Some(run) = pattern.find_at(buffer, cursor) {
            match close_block(run.as_str()) {
                Some(len) => {
                    let span = run.start()..run.start() + len;
                    cursor = span.end;
                    scan.occurrences
                        .push(self.occurrence(buffer, span, OccurrenceClass::AtRule));
                }
                None => {
                    cursor = run.end();
                    scan.malformed.push(run.range());
                }
            }
        }

        scan
    }

    fn scan_pseudo_elements<'b>(&self, buffer: &'b str) -> Scan<'b>
    where
        't: 'b,
    {
        let occurrences = self
            .entry
            .patterns()
            .pseudo
            .find_iter(buffer)
            .map(|m| self.occurrence(buffer, m.range(), OccurrenceClass::PseudoElement))
            .collect();

        Scan {
            occurrences,
            malformed: Vec::new(),
        }
    }
}

/// Whether `rest` reaches `{` before `;` or `}`.
fn opens_block(rest: &str) -> bool {
    matches!(rest.chars().find(|c| matches!(c, '{' | ';' | '}')), Some('{'))
}

fn follows_identifier(buffer: &str, offset: usize) -> bool {
    buffer[..offset]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn next_char_boundary(buffer: &str, offset: usize) -> usize {
    buffer[offset..]
        .chars()
        .next()
        .map_or(buffer.len(), |c| offset + c.len_utf8())
}

/// Length of the prefix of an at-rule run that ends with the `}` closing
/// its first block. `None` if no block opens, or the run stops inside it.
fn close_block(run: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut opened = false;

    for (idx, c) in run.char_indices() {
        match c {
            '{' => {
                depth += 1;
                opened = true;
            }
            '}' => {
                // a stray `}` before the block opens ends the header
                depth = depth.checked_sub(1)?;
                if depth == 0 && opened {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }

    None
}
