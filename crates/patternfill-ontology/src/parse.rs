//! RDF parsing into a lightweight OWL model.
//!
//! Sophia handles the serializations we see in practice:
//! - N-Triples (`.nt`)
//! - Turtle (`.ttl`)
//! - RDF/XML (`.rdf`, `.owl`, `.xml`)
//!
//! Only the OWL vocabulary the curation tooling consumes is extracted:
//! `rdfs:subClassOf` and `owl:equivalentClass` between named classes (the
//! classification input), `rdfs:label`, and `owl:Restriction` /
//! `owl:intersectionOf` blank-node structures on the right-hand side of
//! equivalence axioms (the axiom-rewriting input). Everything else is
//! ignored.

use crate::ClassIri;
use anyhow::{anyhow, Context, Result};
use sophia::api::prelude::*;
use sophia::turtle::parser::nt::NTriplesParser;
use sophia::turtle::parser::turtle::TurtleParser;
use sophia::xml::parser::RdfXmlParser;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

pub const RDF_TYPE_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDFS_SUBCLASS_OF_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_LABEL_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const OWL_CLASS_IRI: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_EQUIVALENT_CLASS_IRI: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
pub const OWL_ON_PROPERTY_IRI: &str = "http://www.w3.org/2002/07/owl#onProperty";
pub const OWL_SOME_VALUES_FROM_IRI: &str = "http://www.w3.org/2002/07/owl#someValuesFrom";
pub const OWL_INTERSECTION_OF_IRI: &str = "http://www.w3.org/2002/07/owl#intersectionOf";

// ============================================================================
// RDF term model (sufficient for OWL extraction)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum RdfNode {
    Iri(String),
    BlankNode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RdfLiteral {
    lexical: String,
    language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum RdfObject {
    Node(RdfNode),
    Literal(RdfLiteral),
}

#[derive(Debug, Clone)]
struct RdfStatement {
    subject: RdfNode,
    predicate_iri: String,
    object: RdfObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
    RdfXml,
}

// ============================================================================
// Statement extraction
// ============================================================================

fn object_of<T: Term>(term: T) -> Option<RdfObject> {
    if let Some(iri) = term.iri() {
        return Some(RdfObject::Node(RdfNode::Iri(iri.as_str().to_string())));
    }
    if let Some(id) = term.bnode_id() {
        return Some(RdfObject::Node(RdfNode::BlankNode(id.as_str().to_string())));
    }
    if let Some(lexical) = term.lexical_form() {
        return Some(RdfObject::Literal(RdfLiteral {
            lexical: lexical.to_string(),
            language: term.language_tag().map(|lt| lt.as_str().to_string()),
        }));
    }
    None
}

fn node_of<T: Term>(term: T) -> Option<RdfNode> {
    match object_of(term)? {
        RdfObject::Node(node) => Some(node),
        RdfObject::Literal(_) => None,
    }
}

/// Drain a triple source into flat statements. Generalized terms (variables,
/// quoted triples) and non-IRI predicates are skipped.
fn collect_statements<S: TripleSource>(
    mut source: S,
    out: &mut Vec<RdfStatement>,
) -> Result<()> {
    source
        .for_each_triple(|t| {
            let Some(subject) = node_of(t.s()) else {
                return;
            };
            let Some(predicate_iri) = t.p().iri().map(|iri| iri.as_str().to_string()) else {
                return;
            };
            let Some(object) = object_of(t.o()) else {
                return;
            };
            out.push(RdfStatement {
                subject,
                predicate_iri,
                object,
            });
        })
        .map_err(|e| anyhow!("{e}"))?;
    Ok(())
}

fn parse_statements(bytes: &[u8], format: RdfFormat) -> Result<Vec<RdfStatement>> {
    let reader = std::io::BufReader::new(std::io::Cursor::new(bytes));
    let mut out: Vec<RdfStatement> = Vec::new();
    match format {
        RdfFormat::NTriples => {
            collect_statements(NTriplesParser::default().parse(reader), &mut out)
                .context("failed to parse N-Triples")?;
        }
        RdfFormat::Turtle => {
            collect_statements(TurtleParser::default().parse(reader), &mut out)
                .context("failed to parse Turtle")?;
        }
        RdfFormat::RdfXml => {
            collect_statements(RdfXmlParser::default().parse(reader), &mut out)
                .context("failed to parse RDF/XML")?;
        }
    }
    Ok(out)
}

// ============================================================================
// OWL model
// ============================================================================

/// A class expression on the right-hand side of an equivalence axiom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassExpression {
    Class(ClassIri),
    SomeValuesFrom {
        property: String,
        filler: Box<ClassExpression>,
    },
    IntersectionOf(Vec<ClassExpression>),
}

/// `EquivalentClasses(named, expression)` with an anonymous right-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceAxiom {
    pub named: ClassIri,
    pub expression: ClassExpression,
}

/// The asserted axioms the curation tooling consumes.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    pub classes: BTreeSet<ClassIri>,
    /// Asserted `rdfs:subClassOf` edges between named classes (sub, super).
    pub subclass_of: Vec<(ClassIri, ClassIri)>,
    /// `owl:equivalentClass` between two named classes.
    pub equivalent_named: Vec<(ClassIri, ClassIri)>,
    /// `owl:equivalentClass` with an anonymous right-hand side.
    pub equivalent_expressions: Vec<EquivalenceAxiom>,
    pub labels: BTreeMap<ClassIri, String>,
}

impl Ontology {
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

pub fn parse_ontology_str(text: &str, format: RdfFormat) -> Result<Ontology> {
    let statements = parse_statements(text.as_bytes(), format)?;
    Ok(build_ontology(&statements))
}

pub fn parse_ontology_file(path: &Path) -> Result<Ontology> {
    let bytes = std::fs::read(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let format = match ext.as_str() {
        "nt" | "ntriples" => RdfFormat::NTriples,
        "ttl" | "turtle" => RdfFormat::Turtle,
        "rdf" | "owl" | "xml" => RdfFormat::RdfXml,
        other => return Err(anyhow!("unsupported ontology format: .{other}")),
    };
    let statements = parse_statements(&bytes, format)?;
    Ok(build_ontology(&statements))
}

fn build_ontology(statements: &[RdfStatement]) -> Ontology {
    // Blank-node statements are indexed first so expression structures can be
    // decoded regardless of statement order in the serialization.
    let mut by_bnode: HashMap<&str, Vec<(&str, &RdfObject)>> = HashMap::new();
    for stmt in statements {
        if let RdfNode::BlankNode(b) = &stmt.subject {
            by_bnode
                .entry(b.as_str())
                .or_default()
                .push((stmt.predicate_iri.as_str(), &stmt.object));
        }
    }

    let mut ontology = Ontology::default();

    for stmt in statements {
        let RdfNode::Iri(subject_iri) = &stmt.subject else {
            continue;
        };
        let subject = ClassIri::new(subject_iri.clone());

        match stmt.predicate_iri.as_str() {
            RDF_TYPE_IRI => {
                if let RdfObject::Node(RdfNode::Iri(ty)) = &stmt.object {
                    if ty == OWL_CLASS_IRI {
                        ontology.classes.insert(subject);
                    }
                }
            }
            RDFS_SUBCLASS_OF_IRI => {
                if let RdfObject::Node(RdfNode::Iri(sup)) = &stmt.object {
                    let sup = ClassIri::new(sup.clone());
                    ontology.classes.insert(subject.clone());
                    ontology.classes.insert(sup.clone());
                    ontology.subclass_of.push((subject, sup));
                }
            }
            OWL_EQUIVALENT_CLASS_IRI => match &stmt.object {
                RdfObject::Node(RdfNode::Iri(other)) => {
                    let other = ClassIri::new(other.clone());
                    ontology.classes.insert(subject.clone());
                    ontology.classes.insert(other.clone());
                    ontology.equivalent_named.push((subject, other));
                }
                RdfObject::Node(RdfNode::BlankNode(b)) => {
                    ontology.classes.insert(subject.clone());
                    match decode_expression(b, &by_bnode, 0) {
                        Some(expression) => ontology.equivalent_expressions.push(EquivalenceAxiom {
                            named: subject,
                            expression,
                        }),
                        None => {
                            tracing::debug!(class = %subject, "skipping undecodable equivalence expression");
                        }
                    }
                }
                RdfObject::Literal(_) => {}
            },
            RDFS_LABEL_IRI => {
                if let RdfObject::Literal(lit) = &stmt.object {
                    // English (or untagged) labels win over other languages.
                    let preferred = matches!(lit.language.as_deref(), None | Some("en"));
                    match ontology.labels.entry(subject) {
                        std::collections::btree_map::Entry::Vacant(e) => {
                            e.insert(lit.lexical.clone());
                        }
                        std::collections::btree_map::Entry::Occupied(mut e) if preferred => {
                            e.insert(lit.lexical.clone());
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    ontology
}

const MAX_EXPRESSION_DEPTH: usize = 64;

fn decode_expression(
    bnode: &str,
    by_bnode: &HashMap<&str, Vec<(&str, &RdfObject)>>,
    depth: usize,
) -> Option<ClassExpression> {
    if depth > MAX_EXPRESSION_DEPTH {
        return None;
    }
    let props = by_bnode.get(bnode)?;

    let find = |pred: &str| -> Option<&RdfObject> {
        props.iter().find(|(p, _)| *p == pred).map(|(_, o)| *o)
    };

    if let Some(filler) = find(OWL_SOME_VALUES_FROM_IRI) {
        let RdfObject::Node(RdfNode::Iri(property)) = find(OWL_ON_PROPERTY_IRI)? else {
            return None;
        };
        let filler = decode_object(filler, by_bnode, depth + 1)?;
        return Some(ClassExpression::SomeValuesFrom {
            property: property.clone(),
            filler: Box::new(filler),
        });
    }

    if let Some(list_head) = find(OWL_INTERSECTION_OF_IRI) {
        let operands = decode_list(list_head, by_bnode, depth + 1)?;
        return Some(ClassExpression::IntersectionOf(operands));
    }

    None
}

fn decode_object(
    object: &RdfObject,
    by_bnode: &HashMap<&str, Vec<(&str, &RdfObject)>>,
    depth: usize,
) -> Option<ClassExpression> {
    match object {
        RdfObject::Node(RdfNode::Iri(iri)) => Some(ClassExpression::Class(ClassIri::new(iri.clone()))),
        RdfObject::Node(RdfNode::BlankNode(b)) => decode_expression(b, by_bnode, depth),
        RdfObject::Literal(_) => None,
    }
}

/// Walk an `rdf:first`/`rdf:rest` list, decoding each member.
fn decode_list(
    head: &RdfObject,
    by_bnode: &HashMap<&str, Vec<(&str, &RdfObject)>>,
    depth: usize,
) -> Option<Vec<ClassExpression>> {
    let mut operands = Vec::new();
    let mut cursor = head.clone();
    loop {
        match cursor {
            RdfObject::Node(RdfNode::Iri(ref iri)) if iri == RDF_NIL_IRI => break,
            RdfObject::Node(RdfNode::BlankNode(ref b)) => {
                let props = by_bnode.get(b.as_str())?;
                let first = props
                    .iter()
                    .find(|(p, _)| *p == RDF_FIRST_IRI)
                    .map(|(_, o)| *o)?;
                operands.push(decode_object(first, by_bnode, depth)?);
                let rest = props
                    .iter()
                    .find(|(p, _)| *p == RDF_REST_IRI)
                    .map(|(_, o)| *o)?;
                if operands.len() > 1024 {
                    return None;
                }
                cursor = rest.clone();
            }
            _ => return None,
        }
    }
    Some(operands)
}

// ============================================================================
// Tests
// ============================================================================
