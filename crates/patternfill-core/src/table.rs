//! Tab-separated match tables.
//!
//! The header row defines the slot columns; each subsequent row is one input
//! record. Output tables reuse the input column order; row order follows set
//! order and carries no meaning.

use crate::{InputRecord, OutputRow};
use patternfill_ontology::ClassIri;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read table: {0}")]
    Io(#[from] io::Error),
    #[error("row {row} has {found} columns, expected {expected}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MatchTable {
    pub columns: Vec<String>,
    pub records: Vec<InputRecord>,
}

pub fn parse_match_table(text: &str) -> Result<MatchTable, TableError> {
    let mut lines = text.lines().enumerate();

    let Some((_, header)) = lines.next() else {
        return Ok(MatchTable::default());
    };
    let columns: Vec<String> = header
        .trim_end_matches('\r')
        .split('\t')
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for (i, line) in lines {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let values: Vec<&str> = line.split('\t').collect();
        if values.len() != columns.len() {
            return Err(TableError::ColumnCount {
                row: i + 1,
                expected: columns.len(),
                found: values.len(),
            });
        }
        let record: InputRecord = columns
            .iter()
            .cloned()
            .zip(values.into_iter().map(|v| ClassIri::new(v.trim())))
            .collect();
        records.push(record);
    }

    Ok(MatchTable { columns, records })
}

pub fn read_match_table(path: &Path) -> Result<MatchTable, TableError> {
    let text = std::fs::read_to_string(path)?;
    parse_match_table(&text)
}

pub fn format_rows(columns: &[String], rows: &BTreeSet<OutputRow>) -> String {
    let mut out = String::new();
    out.push_str(&columns.join("\t"));
    out.push('\n');
    for row in rows {
        let line: Vec<&str> = columns
            .iter()
            .map(|col| row.get(col).map(ClassIri::as_str).unwrap_or(""))
            .collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

pub fn write_rows(
    path: &Path,
    columns: &[String],
    rows: &BTreeSet<OutputRow>,
) -> Result<(), TableError> {
    std::fs::write(path, format_rows(columns, rows))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn header_defines_columns() {
        let table = parse_match_table(
            "anatomy\tphenotype\nhttp://x/UBERON_1\thttp://x/PATO_1\n",
        )
        .unwrap();
        assert_eq!(table.columns, vec!["anatomy", "phenotype"]);
        assert_eq!(table.records.len(), 1);
        assert_eq!(
            table.records[0].get("anatomy"),
            Some(&ClassIri::new("http://x/UBERON_1"))
        );
    }

    #[test]
    fn empty_input_is_an_empty_table() {
        let table = parse_match_table("").unwrap();
        assert!(table.columns.is_empty());
        assert!(table.records.is_empty());
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        let err = parse_match_table("a\tb\nonly-one\n").unwrap_err();
        assert!(matches!(
            err,
            TableError::ColumnCount {
                row: 2,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let table = parse_match_table("a\tb\r\nx\ty\r\n\n").unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].get("b"), Some(&ClassIri::new("y")));
    }

    #[test]
    fn rows_serialize_in_column_order() {
        let columns = vec!["b".to_string(), "a".to_string()];
        let mut rows = BTreeSet::new();
        let mut row = BTreeMap::new();
        row.insert("a".to_string(), ClassIri::new("http://x/A"));
        row.insert("b".to_string(), ClassIri::new("http://x/B"));
        rows.insert(row);
        let text = format_rows(&columns, &rows);
        assert_eq!(text, "b\ta\nhttp://x/B\thttp://x/A\n");
    }
}
