//! Building the multi-variant replacement for an occurrence

use crate::scanner::{Occurrence, OccurrenceClass};
use crate::table::PrefixEntry;

/// Produces replacement text for occurrences of one entry.
///
/// Every variant is a full copy of the matched span with one prefix
/// inserted at the name position. Variants end with `;` or `}`, so they are
/// concatenated without a separator.
pub struct PrefixExpander<'t> {
    entry: &'t PrefixEntry,
}

impl<'t> PrefixExpander<'t> {
    pub fn new(entry: &'t PrefixEntry) -> Self {
        Self { entry }
    }

    pub fn expand(&self, occurrence: &Occurrence<'_>) -> String {
        let text = occurrence.matched_text;
        let name = occurrence.bare_name;
        let mut out = String::with_capacity(text.len() * self.entry.prefixes().len() + 32);

        match occurrence.class {
            OccurrenceClass::PlainProperty if is_property_position(text, name) => {
                for prefix in self.entry.prefixes() {
                    out.push_str(prefix);
                    out.push_str(text);
                }
            }
            OccurrenceClass::PlainProperty => {
                let (head, value) = split_value(text);
                for prefix in self.entry.prefixes() {
                    out.push_str(head);
                    out.push_str(prefix);
                    out.push_str(value);
                }
            }
            OccurrenceClass::AtRule => {
                let rest = text.strip_prefix('@').unwrap_or(text);
                for prefix in self.entry.prefixes() {
                    out.push('@');
                    out.push_str(prefix);
                    out.push_str(rest);
                }
            }
            OccurrenceClass::PseudoElement => {
                let (selector, block) = text.split_at(text.find('{').unwrap_or(text.len()));
                for prefix in self.entry.prefixes() {
                    push_prefixed_selector(&mut out, selector, name, prefix);
                    out.push_str(block);
                }
            }
        }

        out
    }
}

/// The declaration's property is the name itself (`opacity: 1;`), as
/// opposed to the name being its value (`transition: opacity 1s;`).
fn is_property_position(text: &str, name: &str) -> bool {
    text.strip_prefix(name)
        .is_some_and(|rest| rest.trim_start().starts_with(':'))
}

/// Split `property: value;` right before the value token, keeping the
/// whitespace after the colon on the left.
fn split_value(text: &str) -> (&str, &str) {
    let Some(colon) = text.find(':') else {
        return ("", text);
    };
    let after = &text[colon + 1..];
    let value_start = colon + 1 + (after.len() - after.trim_start().len());
    text.split_at(value_start)
}

/// Copy `selector`, inserting `prefix` after the colon of every `:name`
/// pseudo. Class names and ids that merely contain `name` are left alone.
fn push_prefixed_selector(out: &mut String, selector: &str, name: &str, prefix: &str) {
    let mut cursor = 0;
    for (idx, _) in selector.match_indices(name) {
        let is_pseudo = selector[..idx].ends_with(':');
        let whole_name = !selector[idx + name.len()..]
            .starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if is_pseudo && whole_name {
            out.push_str(&selector[cursor..idx]);
            out.push_str(prefix);
            cursor = idx;
        }
    }
    out.push_str(&selector[cursor..]);
}
