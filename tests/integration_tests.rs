//! End-to-end tests across crates: ontology file -> subsumption index ->
//! pattern compilation -> batch expansion -> table on disk.
//!
//! Run with: cargo test --test integration_tests

use patternfill_core::{
    load_expand_flags, process_pattern, read_match_table, write_rows, NamespaceWhitelist,
    PatternDefinition,
};
use patternfill_ontology::{parse_ontology_file, ClassIri, SubsumptionIndex};
use std::fs;
use tempfile::tempdir;

const ONTOLOGY_TTL: &str = r#"
@prefix obo: <http://purl.obolibrary.org/obo/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
obo:UBERON_0001234 rdfs:subClassOf obo:UBERON_0000062 .
obo:UBERON_0000062 rdfs:subClassOf obo:UBERON_0000061 .
obo:PATO_0000587 rdfs:subClassOf obo:PATO_0000460 .
obo:PATO_0000460 rdfs:subClassOf obo:PATO_0000001 .
"#;

const PATTERN_YAML: &str = r#"
pattern_name: abnormalAnatomicalEntity
classes:
  anatomical entity: "UBERON:0000061"
  quality: "PATO:0000001"
vars:
  anatomy: "'anatomical entity'"
  phenotype: "'quality'"
"#;

const MATCHES_TSV: &str = "anatomy\tphenotype\n\
    http://purl.obolibrary.org/obo/UBERON_0001234\thttp://purl.obolibrary.org/obo/PATO_0000587\n";

#[test]
fn file_to_file_pipeline() {
    let dir = tempdir().expect("tempdir");
    let ontology_path = dir.path().join("ontology.ttl");
    let pattern_path = dir.path().join("abnormalAnatomicalEntity.yaml");
    let matches_path = dir.path().join("abnormalAnatomicalEntity.tsv");
    let whitelist_path = dir.path().join("legal_fillers.txt");
    let expand_path = dir.path().join("expand_vars.txt");
    let out_path = dir.path().join("out.tsv");

    fs::write(&ontology_path, ONTOLOGY_TTL).expect("write ontology");
    fs::write(&pattern_path, PATTERN_YAML).expect("write pattern");
    fs::write(&matches_path, MATCHES_TSV).expect("write matches");
    fs::write(
        &whitelist_path,
        "http://purl.obolibrary.org/obo/UBERON_\nhttp://purl.obolibrary.org/obo/PATO_\n",
    )
    .expect("write whitelist");
    fs::write(&expand_path, "phenotype\n").expect("write expand flags");

    let ontology = parse_ontology_file(&ontology_path).expect("parse ontology");
    let index = SubsumptionIndex::build(&ontology);

    let table = read_match_table(&matches_path).expect("read table");
    let whitelist = NamespaceWhitelist::from_file(&whitelist_path).expect("read whitelist");
    let flags = load_expand_flags(&expand_path).expect("read expand flags");
    let pattern = PatternDefinition::from_file(&pattern_path)
        .expect("read pattern")
        .compile(&table.columns, &flags)
        .expect("compile pattern");

    let output = process_pattern(&index, &pattern, &table.records, &whitelist).expect("batch");

    // anatomy stays at the leaf; phenotype expands to leaf, intermediate and
    // anchor.
    assert_eq!(output.summary.records_in, 1);
    assert_eq!(output.summary.records_discarded, 0);
    assert_eq!(output.summary.anchor_violations, 0);
    assert_eq!(output.summary.distinct_rows, 3);

    write_rows(&out_path, &table.columns, &output.rows).expect("write rows");
    let written = read_match_table(&out_path).expect("re-read output");
    assert_eq!(written.columns, table.columns);
    assert_eq!(written.records.len(), 3);
    for record in &written.records {
        assert_eq!(
            record.get("anatomy"),
            Some(&ClassIri::from_curie("UBERON:0001234"))
        );
    }
    let phenotypes: Vec<&ClassIri> = written
        .records
        .iter()
        .filter_map(|r| r.get("phenotype"))
        .collect();
    for curie in ["PATO:0000587", "PATO:0000460", "PATO:0000001"] {
        assert!(phenotypes.contains(&&ClassIri::from_curie(curie)));
    }
}

#[test]
fn malformed_pattern_definition_fails_that_pattern_only() {
    let dir = tempdir().expect("tempdir");
    let pattern_path = dir.path().join("broken.yaml");
    // `anatomy` references a class name that is never declared.
    fs::write(
        &pattern_path,
        "classes:\n  quality: \"PATO:0000001\"\nvars:\n  anatomy: \"'anatomical entity'\"\n",
    )
    .expect("write pattern");

    let definition = PatternDefinition::from_file(&pattern_path).expect("read pattern");
    let columns = vec!["anatomy".to_string()];
    assert!(definition.compile(&columns, &Default::default()).is_err());
}

#[test]
fn record_bound_outside_its_anchor_is_discarded_not_fatal() {
    let dir = tempdir().expect("tempdir");
    let ontology_path = dir.path().join("ontology.ttl");
    fs::write(&ontology_path, ONTOLOGY_TTL).expect("write ontology");
    let ontology = parse_ontology_file(&ontology_path).expect("parse ontology");
    let index = SubsumptionIndex::build(&ontology);

    // The phenotype column carries an anatomy class.
    let tsv = "anatomy\tphenotype\n\
        http://purl.obolibrary.org/obo/UBERON_0001234\thttp://purl.obolibrary.org/obo/UBERON_0001234\n";
    let table = patternfill_core::parse_match_table(tsv).expect("table");
    let flags = ["phenotype".to_string()].into_iter().collect();
    let pattern = PatternDefinition::from_yaml_str(PATTERN_YAML)
        .expect("pattern")
        .compile(&table.columns, &flags)
        .expect("compile");
    let whitelist = NamespaceWhitelist::new(vec!["http://purl.obolibrary.org/obo/".to_string()]);

    let output = process_pattern(&index, &pattern, &table.records, &whitelist).expect("batch");
    assert_eq!(output.summary.records_in, 1);
    assert_eq!(output.summary.records_discarded, 1);
    assert_eq!(output.summary.anchor_violations, 1);
    assert!(output.rows.is_empty());
}
