//! Vendor prefix insertion for stylesheets
//!
//! Scans stylesheet text for the names in a [`PrefixTable`] and rewrites
//! every matching declaration, at-rule or pseudo-element selector into one
//! variant per vendor prefix. Matching is pattern based: there is no
//! tokenizer and no syntax tree, and the text between matches is copied
//! through untouched.
//!
//! ```
//! use vendorize_prefix::{PrefixTable, expand};
//!
//! let table = PrefixTable::from_pairs([("opacity", &["-moz-", ""][..])]).unwrap();
//! let out = expand(".a { opacity: 0.5; }", &table).unwrap();
//! assert_eq!(out, ".a { -moz-opacity: 0.5;opacity: 0.5; }");
//! ```

mod engine;
mod error;
mod expander;
mod scanner;
mod table;

pub use engine::{ExpandStats, FilteredView, PrefixEngine, ViewEntry, expand, strip_comments};
pub use error::{Error, Result};
pub use expander::PrefixExpander;
pub use scanner::{DeclarationScanner, Occurrence, OccurrenceClass, Presence, Scan};
pub use table::{DEFAULT_PREFIXES, PrefixEntry, PrefixTable, default_table};
