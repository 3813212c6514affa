//! Taxon restriction of phenotype equivalence axioms.
//!
//! Rewrites every `EquivalentClasses` axiom whose right-hand side is
//! `'has part' some (C1 and C2 and ...)` into
//! `'has part' some (C1 and C2 and ... and 'present in taxon' some TAXON)`,
//! and appends the taxon label to every class under the phenotype root. The
//! result is emitted as an OWL functional-syntax fragment to be merged back
//! into the source ontology.

use anyhow::{Context, Result};
use colored::Colorize;
use patternfill_ontology::{
    parse_ontology_file, ClassExpression, ClassIri, Classification, SubsumptionIndex,
};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const HAS_PART_IRI: &str = "http://purl.obolibrary.org/obo/BFO_0000051";
pub const PRESENT_IN_TAXON_IRI: &str = "http://purl.obolibrary.org/obo/RO_0002175";

pub struct TaxonRestriction {
    pub taxon: ClassIri,
    pub taxon_label: String,
    pub phenotype_root: ClassIri,
    /// Classes whose equivalence axioms are dropped instead of rewritten.
    pub preserve: BTreeSet<ClassIri>,
}

pub fn load_preserve_list(path: &Path) -> Result<BTreeSet<ClassIri>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ClassIri::from_curie)
        .collect())
}

pub fn run(ontology_path: &Path, out_path: &Path, config: &TaxonRestriction) -> Result<()> {
    println!("Loading ontology: {}", ontology_path.display());
    let ontology = parse_ontology_file(ontology_path)
        .with_context(|| format!("loading {}", ontology_path.display()))?;
    let index = SubsumptionIndex::build(&ontology);
    let phenotype_classes = index.descendants(&config.phenotype_root)?;

    let mut doc = String::new();
    writeln!(doc, "Prefix(rdfs:=<http://www.w3.org/2000/01/rdf-schema#>)")?;
    writeln!(
        doc,
        "Ontology(<http://purl.obolibrary.org/obo/patternfill/taxon-restrictions.owl>"
    )?;

    let mut rewritten = 0usize;
    let mut kept = 0usize;
    let mut dropped = 0usize;

    for axiom in &ontology.equivalent_expressions {
        if config.preserve.contains(&axiom.named) {
            dropped += 1;
            continue;
        }
        let expression = match rewrite_expression(&axiom.expression, &config.taxon) {
            Some(expression) => {
                rewritten += 1;
                expression
            }
            None => {
                kept += 1;
                axiom.expression.clone()
            }
        };
        writeln!(
            doc,
            "EquivalentClasses(<{}> {})",
            axiom.named,
            render(&expression)
        )?;
    }

    for (left, right) in &ontology.equivalent_named {
        if config.preserve.contains(left) || config.preserve.contains(right) {
            dropped += 1;
            continue;
        }
        writeln!(doc, "EquivalentClasses(<{left}> <{right}>)")?;
        kept += 1;
    }

    let mut relabelled = 0usize;
    for class in &phenotype_classes {
        if let Some(label) = ontology.labels.get(class) {
            writeln!(
                doc,
                "AnnotationAssertion(rdfs:label <{}> \"{} ({})\")",
                class,
                escape_literal(label),
                escape_literal(&config.taxon_label)
            )?;
            relabelled += 1;
        }
    }

    writeln!(doc, ")")?;
    fs::write(out_path, doc).with_context(|| format!("writing {}", out_path.display()))?;

    println!(
        "{} {} axioms rewritten, {} kept, {} dropped, {} classes relabelled",
        "ok".green().bold(),
        rewritten,
        kept,
        dropped,
        relabelled
    );
    Ok(())
}

/// Injects `'present in taxon' some taxon` into the conjunctive filler of a
/// `'has part'` restriction. Any other shape is left alone.
fn rewrite_expression(expression: &ClassExpression, taxon: &ClassIri) -> Option<ClassExpression> {
    match expression {
        ClassExpression::SomeValuesFrom { property, filler } if property == HAS_PART_IRI => {
            let ClassExpression::IntersectionOf(operands) = filler.as_ref() else {
                return None;
            };
            let mut operands = operands.clone();
            operands.push(ClassExpression::SomeValuesFrom {
                property: PRESENT_IN_TAXON_IRI.to_string(),
                filler: Box::new(ClassExpression::Class(taxon.clone())),
            });
            Some(ClassExpression::SomeValuesFrom {
                property: property.clone(),
                filler: Box::new(ClassExpression::IntersectionOf(operands)),
            })
        }
        _ => None,
    }
}

fn render(expression: &ClassExpression) -> String {
    match expression {
        ClassExpression::Class(class) => format!("<{class}>"),
        ClassExpression::SomeValuesFrom { property, filler } => {
            format!("ObjectSomeValuesFrom(<{property}> {})", render(filler))
        }
        ClassExpression::IntersectionOf(operands) => {
            let inner: Vec<String> = operands.iter().map(render).collect();
            format!("ObjectIntersectionOf({})", inner.join(" "))
        }
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
