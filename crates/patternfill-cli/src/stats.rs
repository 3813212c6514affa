//! Descriptive ontology statistics exported as CSV.
//!
//! Writes two files into the output directory:
//! - `data_namespaces.csv`: class counts per OBO namespace
//! - `data_terms.csv`: per-class subclass counts, coverage percentages and
//!   the namespaces those subclasses come from

use anyhow::{Context, Result};
use colored::Colorize;
use patternfill_ontology::{parse_ontology_file, Classification, SubsumptionIndex, OBO_PURL};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub fn run(ontology_path: &Path, out_dir: &Path) -> Result<()> {
    println!("Loading ontology: {}", ontology_path.display());
    let ontology = parse_ontology_file(ontology_path)
        .with_context(|| format!("loading {}", ontology_path.display()))?;
    let index = SubsumptionIndex::build(&ontology);
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let total = index.classes().filter(|c| !c.is_owl_thing()).count();

    let mut ns_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut terms = String::from("id,label,namespace,ct_subclasses,pc_subclasses,subclass_sources\n");

    for class in index.classes() {
        if class.is_owl_thing() {
            continue;
        }
        let ns = namespace_of(class.as_str());
        *ns_counts.entry(ns.clone()).or_default() += 1;

        let subclasses = index.descendants(class)?;
        let sources: BTreeSet<String> = subclasses
            .iter()
            .map(|c| namespace_of(c.as_str()))
            .collect();
        let coverage = if total > 0 {
            100.0 * subclasses.len() as f64 / total as f64
        } else {
            0.0
        };
        let label = ontology.labels.get(class).map(String::as_str).unwrap_or("");
        let sources = sources.into_iter().collect::<Vec<_>>().join("|");
        writeln!(
            terms,
            "{},{},{},{},{:.4},{}",
            csv_field(class.as_str()),
            csv_field(label),
            csv_field(&ns),
            subclasses.len(),
            coverage,
            csv_field(&sources)
        )?;
    }

    let mut namespaces = String::from("namespace,ct_classes\n");
    for (ns, count) in &ns_counts {
        writeln!(namespaces, "{},{count}", csv_field(ns))?;
    }

    fs::write(out_dir.join("data_namespaces.csv"), namespaces)?;
    fs::write(out_dir.join("data_terms.csv"), terms)?;
    println!(
        "{} {} classes across {} namespaces",
        "ok".green().bold(),
        total,
        ns_counts.len()
    );
    Ok(())
}

/// The lowercased ID-space prefix of an OBO PURL (`.../obo/UBERON_123` ->
/// `uberon`), or `other` for anything else.
fn namespace_of(iri: &str) -> String {
    if let Some(local) = iri.strip_prefix(OBO_PURL) {
        if let Some((prefix, _)) = local.split_once('_') {
            if !prefix.is_empty() {
                return prefix.to_lowercase();
            }
        }
    }
    "other".to_string()
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
