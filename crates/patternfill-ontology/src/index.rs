//! Transitive-closure classification over the asserted hierarchy.
//!
//! Class IRIs are interned to dense u32 ids, equivalence cycles are condensed
//! into groups (Tarjan), and per-group ancestor/descendant closures are held
//! as roaring bitmaps. The index is immutable after [`SubsumptionIndex::build`]
//! and can be shared across threads by reference.
//!
//! Semantics follow a reasoner's *strict* super/subclass views:
//!
//! - a class is never its own ancestor or descendant;
//! - equivalent classes are not each other's ancestors;
//! - `owl:Thing` is an implicit ancestor of every other class, including
//!   classes absent from the loaded ontology, and has no ancestors itself.

use crate::parse::Ontology;
use crate::{ClassIri, Classification, ClassificationError};
use roaring::RoaringBitmap;
use std::collections::{BTreeSet, HashMap};

pub struct SubsumptionIndex {
    iri_to_id: HashMap<ClassIri, u32>,
    id_to_iri: Vec<ClassIri>,
    group_of: Vec<u32>,
    group_members: Vec<Vec<u32>>,
    group_ancestors: Vec<RoaringBitmap>,
    group_descendants: Vec<RoaringBitmap>,
}

impl SubsumptionIndex {
    pub fn build(ontology: &Ontology) -> Self {
        let mut iri_to_id: HashMap<ClassIri, u32> = HashMap::new();
        let mut id_to_iri: Vec<ClassIri> = Vec::new();
        let mut intern = |iri: &ClassIri, id_to_iri: &mut Vec<ClassIri>| -> u32 {
            if let Some(&id) = iri_to_id.get(iri) {
                return id;
            }
            let id = id_to_iri.len() as u32;
            id_to_iri.push(iri.clone());
            iri_to_id.insert(iri.clone(), id);
            id
        };

        for class in &ontology.classes {
            intern(class, &mut id_to_iri);
        }

        let mut out_edges: Vec<Vec<u32>> = vec![Vec::new(); id_to_iri.len()];
        let mut add_edge = |from: u32, to: u32, out_edges: &mut Vec<Vec<u32>>| {
            let needed = (from.max(to) as usize) + 1;
            if out_edges.len() < needed {
                out_edges.resize(needed, Vec::new());
            }
            out_edges[from as usize].push(to);
        };

        for (sub, sup) in &ontology.subclass_of {
            let s = intern(sub, &mut id_to_iri);
            let p = intern(sup, &mut id_to_iri);
            if s != p {
                add_edge(s, p, &mut out_edges);
            }
        }
        // Named equivalences become subsumption cycles; condensation below
        // collapses them into one group.
        for (a, b) in &ontology.equivalent_named {
            let x = intern(a, &mut id_to_iri);
            let y = intern(b, &mut id_to_iri);
            if x != y {
                add_edge(x, y, &mut out_edges);
                add_edge(y, x, &mut out_edges);
            }
        }
        out_edges.resize(id_to_iri.len(), Vec::new());

        let (group_of, group_count) = condense(&out_edges);

        let mut group_members: Vec<Vec<u32>> = vec![Vec::new(); group_count];
        for (id, &g) in group_of.iter().enumerate() {
            group_members[g as usize].push(id as u32);
        }

        // Tarjan emits components in reverse topological order: every group
        // reachable from g (its ancestors, edges point sub -> super) has a
        // smaller id, so one forward pass closes the ancestor sets.
        let mut group_out: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); group_count];
        for (v, targets) in out_edges.iter().enumerate() {
            for &w in targets {
                let (gv, gw) = (group_of[v], group_of[w as usize]);
                if gv != gw {
                    group_out[gv as usize].insert(gw);
                }
            }
        }

        let mut group_ancestors: Vec<RoaringBitmap> =
            (0..group_count).map(|_| RoaringBitmap::new()).collect();
        for g in 0..group_count {
            let mut acc = RoaringBitmap::new();
            for &h in &group_out[g] {
                acc.insert(h);
                acc |= &group_ancestors[h as usize];
            }
            group_ancestors[g] = acc;
        }

        let mut group_descendants: Vec<RoaringBitmap> =
            (0..group_count).map(|_| RoaringBitmap::new()).collect();
        for g in 0..group_count {
            for a in group_ancestors[g].iter() {
                group_descendants[a as usize].insert(g as u32);
            }
        }

        Self {
            iri_to_id,
            id_to_iri,
            group_of,
            group_members,
            group_ancestors,
            group_descendants,
        }
    }

    pub fn class_count(&self) -> usize {
        self.id_to_iri.len()
    }

    pub fn contains(&self, class: &ClassIri) -> bool {
        self.iri_to_id.contains_key(class)
    }

    /// All classes known to the index, `owl:Thing` included if asserted.
    pub fn classes(&self) -> impl Iterator<Item = &ClassIri> {
        self.id_to_iri.iter()
    }

    fn group_of_class(&self, class: &ClassIri) -> Result<Option<u32>, ClassificationError> {
        let Some(&id) = self.iri_to_id.get(class) else {
            return Ok(None);
        };
        self.group_of
            .get(id as usize)
            .copied()
            .map(Some)
            .ok_or_else(|| {
                ClassificationError::Unavailable(format!("class table corrupt for {class}"))
            })
    }

    fn collect_members(
        &self,
        groups: &RoaringBitmap,
        out: &mut BTreeSet<ClassIri>,
    ) -> Result<(), ClassificationError> {
        for g in groups.iter() {
            let members = self.group_members.get(g as usize).ok_or_else(|| {
                ClassificationError::Unavailable(format!("unknown class group {g}"))
            })?;
            for &id in members {
                let iri = self.id_to_iri.get(id as usize).ok_or_else(|| {
                    ClassificationError::Unavailable(format!("unknown class id {id}"))
                })?;
                out.insert(iri.clone());
            }
        }
        Ok(())
    }
}

impl Classification for SubsumptionIndex {
    fn ancestors(&self, class: &ClassIri) -> Result<BTreeSet<ClassIri>, ClassificationError> {
        let mut out = BTreeSet::new();
        if class.is_owl_thing() {
            return Ok(out);
        }
        if let Some(group) = self.group_of_class(class)? {
            let ancestors = self.group_ancestors.get(group as usize).ok_or_else(|| {
                ClassificationError::Unavailable(format!("unknown class group {group}"))
            })?;
            self.collect_members(ancestors, &mut out)?;
        }
        out.remove(class);
        out.insert(ClassIri::owl_thing());
        Ok(out)
    }

    fn descendants(&self, class: &ClassIri) -> Result<BTreeSet<ClassIri>, ClassificationError> {
        let mut out = BTreeSet::new();
        if class.is_owl_thing() {
            for iri in &self.id_to_iri {
                if !iri.is_owl_thing() {
                    out.insert(iri.clone());
                }
            }
            return Ok(out);
        }
        if let Some(group) = self.group_of_class(class)? {
            let descendants = self.group_descendants.get(group as usize).ok_or_else(|| {
                ClassificationError::Unavailable(format!("unknown class group {group}"))
            })?;
            self.collect_members(descendants, &mut out)?;
        }
        out.remove(class);
        out.retain(|c| !c.is_owl_thing());
        Ok(out)
    }

    fn is_ancestor(&self, candidate: &ClassIri, of: &ClassIri) -> Result<bool, ClassificationError> {
        if of.is_owl_thing() {
            return Ok(false);
        }
        if candidate.is_owl_thing() {
            return Ok(true);
        }
        let (Some(gc), Some(go)) = (self.group_of_class(candidate)?, self.group_of_class(of)?)
        else {
            return Ok(false);
        };
        if gc == go {
            return Ok(false);
        }
        let ancestors = self.group_ancestors.get(go as usize).ok_or_else(|| {
            ClassificationError::Unavailable(format!("unknown class group {go}"))
        })?;
        Ok(ancestors.contains(gc))
    }
}

/// Iterative Tarjan condensation. Returns the component id per node and the
/// component count; components come out in reverse topological order of the
/// condensation DAG.
fn condense(out_edges: &[Vec<u32>]) -> (Vec<u32>, usize) {
    const UNVISITED: u32 = u32::MAX;
    let n = out_edges.len();
    let mut index_of = vec![UNVISITED; n];
    let mut lowlink = vec![0u32; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<u32> = Vec::new();
    let mut comp_of = vec![0u32; n];
    let mut comp_count: u32 = 0;
    let mut next_index: u32 = 0;
    let mut call: Vec<(u32, usize)> = Vec::new();

    for start in 0..n as u32 {
        if index_of[start as usize] != UNVISITED {
            continue;
        }
        index_of[start as usize] = next_index;
        lowlink[start as usize] = next_index;
        next_index += 1;
        stack.push(start);
        on_stack[start as usize] = true;
        call.push((start, 0));

        while let Some(frame) = call.last_mut() {
            let v = frame.0 as usize;
            if frame.1 < out_edges[v].len() {
                let w = out_edges[v][frame.1] as usize;
                frame.1 += 1;
                if index_of[w] == UNVISITED {
                    index_of[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w as u32);
                    on_stack[w] = true;
                    call.push((w as u32, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index_of[w]);
                }
            } else {
                call.pop();
                if let Some(parent) = call.last() {
                    let p = parent.0 as usize;
                    lowlink[p] = lowlink[p].min(lowlink[v]);
                }
                if lowlink[v] == index_of[v] {
                    loop {
                        let Some(w) = stack.pop() else {
                            break;
                        };
                        on_stack[w as usize] = false;
                        comp_of[w as usize] = comp_count;
                        if w as usize == v {
                            break;
                        }
                    }
                    comp_count += 1;
                }
            }
        }
    }

    (comp_of, comp_count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_ontology_str, RdfFormat};

    fn chain_ontology() -> Ontology {
        let ttl = r#"
@prefix obo: <http://purl.obolibrary.org/obo/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
obo:PATO_0000587 rdfs:subClassOf obo:PATO_0000460 .
obo:PATO_0000460 rdfs:subClassOf obo:PATO_0000001 .
obo:UBERON_0001234 rdfs:subClassOf obo:UBERON_0000062 .
obo:UBERON_0000062 rdfs:subClassOf obo:UBERON_0000061 .
obo:MP_0000002 owl:equivalentClass obo:HP_0000002 .
obo:MP_0000002 rdfs:subClassOf obo:PATO_0000001 .
"#;
        parse_ontology_str(ttl, RdfFormat::Turtle).expect("parse")
    }

    fn c(curie: &str) -> ClassIri {
        ClassIri::from_curie(curie)
    }

    #[test]
    fn ancestors_are_strict_and_transitive() {
        let index = SubsumptionIndex::build(&chain_ontology());
        let a = index.ancestors(&c("PATO:0000587")).unwrap();
        assert!(a.contains(&c("PATO:0000460")));
        assert!(a.contains(&c("PATO:0000001")));
        assert!(a.contains(&ClassIri::owl_thing()));
        assert!(!a.contains(&c("PATO:0000587")));
    }

    #[test]
    fn descendants_are_strict_and_transitive() {
        let index = SubsumptionIndex::build(&chain_ontology());
        let d = index.descendants(&c("PATO:0000001")).unwrap();
        assert!(d.contains(&c("PATO:0000460")));
        assert!(d.contains(&c("PATO:0000587")));
        assert!(!d.contains(&c("PATO:0000001")));
        assert!(!d.contains(&c("UBERON:0001234")));
    }

    #[test]
    fn equivalent_classes_are_not_each_others_ancestors() {
        let index = SubsumptionIndex::build(&chain_ontology());
        let a = index.ancestors(&c("MP:0000002")).unwrap();
        assert!(!a.contains(&c("HP:0000002")));
        assert!(a.contains(&c("PATO:0000001")));
        // but the equivalent class inherits the same ancestors
        let b = index.ancestors(&c("HP:0000002")).unwrap();
        assert!(b.contains(&c("PATO:0000001")));
        assert!(!index.is_ancestor(&c("HP:0000002"), &c("MP:0000002")).unwrap());
    }

    #[test]
    fn owl_thing_is_implicit_top() {
        let index = SubsumptionIndex::build(&chain_ontology());
        assert!(index
            .is_ancestor(&ClassIri::owl_thing(), &c("PATO:0000587"))
            .unwrap());
        assert!(index.ancestors(&ClassIri::owl_thing()).unwrap().is_empty());
        let d = index.descendants(&ClassIri::owl_thing()).unwrap();
        assert!(d.contains(&c("UBERON:0000061")));
    }

    #[test]
    fn unknown_class_has_only_owl_thing_above() {
        let index = SubsumptionIndex::build(&chain_ontology());
        let a = index.ancestors(&c("XAO:9999999")).unwrap();
        assert_eq!(a.len(), 1);
        assert!(a.contains(&ClassIri::owl_thing()));
        assert!(index.descendants(&c("XAO:9999999")).unwrap().is_empty());
    }

    #[test]
    fn is_ancestor_matches_ancestor_sets() {
        let index = SubsumptionIndex::build(&chain_ontology());
        assert!(index
            .is_ancestor(&c("PATO:0000001"), &c("PATO:0000587"))
            .unwrap());
        assert!(!index
            .is_ancestor(&c("PATO:0000587"), &c("PATO:0000001"))
            .unwrap());
        assert!(!index
            .is_ancestor(&c("UBERON:0000061"), &c("PATO:0000587"))
            .unwrap());
    }
}
