//! Pattern filler curation engine.
//!
//! Given a design pattern whose variable slots are bound to abstract anchor
//! classes and a table of concrete leaf-class assignments for those slots,
//! this crate computes, per slot, the set of "in-between" generalizations of
//! the leaf below its anchor, filters them against a namespace whitelist, and
//! expands the per-slot candidate sets into a deduplicated cross-product of
//! fully instantiated rows.
//!
//! Pipeline, leaf-first:
//!
//! - [`whitelist::NamespaceWhitelist`]: accepted identifier prefixes.
//! - [`resolve`]: per (leaf, anchor, expand-flag) triple, the between-set.
//! - [`expand`]: per input record, candidate sets and their cross-product.
//! - [`batch`]: per pattern table, parallel expansion, global dedup and
//!   summary counts.
//!
//! Classification is consumed through the
//! [`Classification`](patternfill_ontology::Classification) trait; nothing in
//! this crate mutates shared state, so record expansion parallelizes freely.

pub mod batch;
pub mod expand;
pub mod pattern;
pub mod resolve;
pub mod table;
pub mod whitelist;

pub use batch::{process_pattern, BatchOutput, BatchSummary};
pub use expand::{expand_record, Discard, ExpandError, RecordExpansion};
pub use pattern::{load_expand_flags, CompiledPattern, PatternDefinition, PatternError};
pub use resolve::{resolve, Resolution};
pub use table::{parse_match_table, read_match_table, write_rows, MatchTable, TableError};
pub use whitelist::NamespaceWhitelist;

pub use patternfill_ontology::{ClassIri, Classification, ClassificationError};

use std::collections::BTreeMap;

/// One source row: slot name to concrete leaf class.
pub type InputRecord = BTreeMap<String, ClassIri>;

/// One fully bound result row: slot name to filler class. Two rows are the
/// same row iff all slot bindings match.
pub type OutputRow = BTreeMap<String, ClassIri>;
