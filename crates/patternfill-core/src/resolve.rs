//! In-between filler resolution.
//!
//! For one (leaf, anchor, expand-flag) triple, compute the set of acceptable
//! generalizations of the leaf that do not cross above the anchor:
//!
//! 1. `base = {leaf}`, plus all strict ancestors of the leaf when expanding.
//! 2. The leaf must actually be classified under the anchor; otherwise the
//!    record contradicts the pattern's slot declaration and the outcome is an
//!    [`Resolution::AnchorViolation`].
//! 3. Subtract the anchor's own ancestors: generalizations no more specific
//!    than what the anchor already implies add no information. The anchor
//!    itself survives the subtraction (strict ancestry), so it can appear as
//!    the maximally general filler.
//!
//! Ancestry is strict throughout, so a leaf equal to its anchor fails the
//! precondition and resolves as a violation.

use patternfill_ontology::{ClassIri, Classification, ClassificationError};
use std::collections::BTreeSet;
use tracing::warn;

/// Outcome of resolving one slot of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The between-set, before whitelist filtering. May be empty.
    Candidates(BTreeSet<ClassIri>),
    /// The leaf is not a descendant of the anchor. The caller discards the
    /// record; the batch goes on.
    AnchorViolation,
}

/// Resolve the between-set for one slot. Pure: identical inputs against an
/// unchanged oracle yield identical outcomes.
pub fn resolve(
    oracle: &(impl Classification + ?Sized),
    leaf: &ClassIri,
    anchor: &ClassIri,
    expand: bool,
) -> Result<Resolution, ClassificationError> {
    let ancestors = oracle.ancestors(leaf)?;

    if !ancestors.contains(anchor) {
        warn!(%leaf, %anchor, "class is not classified under its slot anchor; this should not happen");
        return Ok(Resolution::AnchorViolation);
    }

    let mut between = if expand { ancestors } else { BTreeSet::new() };
    between.insert(leaf.clone());

    let exclude = oracle.ancestors(anchor)?;
    between.retain(|class| !exclude.contains(class));

    Ok(Resolution::Candidates(between))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Fixed ancestor tables standing in for a reasoner snapshot.
    struct FixedClassification {
        ancestors: BTreeMap<ClassIri, BTreeSet<ClassIri>>,
    }

    impl FixedClassification {
        fn new(entries: &[(&str, &[&str])]) -> Self {
            let ancestors = entries
                .iter()
                .map(|(class, ans)| {
                    (
                        ClassIri::from_curie(class),
                        ans.iter().map(|a| ClassIri::from_curie(a)).collect(),
                    )
                })
                .collect();
            Self { ancestors }
        }
    }

    impl Classification for FixedClassification {
        fn ancestors(&self, class: &ClassIri) -> Result<BTreeSet<ClassIri>, ClassificationError> {
            Ok(self.ancestors.get(class).cloned().unwrap_or_default())
        }

        fn descendants(
            &self,
            class: &ClassIri,
        ) -> Result<BTreeSet<ClassIri>, ClassificationError> {
            let mut out = BTreeSet::new();
            for (c, ans) in &self.ancestors {
                if ans.contains(class) {
                    out.insert(c.clone());
                }
            }
            Ok(out)
        }
    }

    fn c(curie: &str) -> ClassIri {
        ClassIri::from_curie(curie)
    }

    fn oracle() -> FixedClassification {
        FixedClassification::new(&[
            ("PATO:0000587", &["PATO:0000460", "PATO:0000001"]),
            ("PATO:0000460", &["PATO:0000001"]),
            ("UBERON:0001234", &["UBERON:0000062", "UBERON:0000061"]),
            ("UBERON:0000062", &["UBERON:0000061"]),
        ])
    }

    #[test]
    fn no_expansion_yields_the_leaf_only() {
        let r = resolve(&oracle(), &c("UBERON:0001234"), &c("UBERON:0000061"), false).unwrap();
        assert_eq!(
            r,
            Resolution::Candidates([c("UBERON:0001234")].into_iter().collect())
        );
    }

    #[test]
    fn expansion_keeps_everything_below_the_anchor() {
        let r = resolve(&oracle(), &c("PATO:0000587"), &c("PATO:0000001"), true).unwrap();
        let Resolution::Candidates(set) = r else {
            panic!("expected candidates");
        };
        // anchor's own ancestors are excluded, the anchor itself survives
        assert_eq!(
            set,
            [c("PATO:0000587"), c("PATO:0000460"), c("PATO:0000001")]
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn expansion_stops_at_the_anchor() {
        let r = resolve(&oracle(), &c("PATO:0000587"), &c("PATO:0000460"), true).unwrap();
        let Resolution::Candidates(set) = r else {
            panic!("expected candidates");
        };
        assert!(!set.contains(&c("PATO:0000001")));
        assert!(set.contains(&c("PATO:0000460")));
        assert!(set.contains(&c("PATO:0000587")));
    }

    #[test]
    fn anchor_violation_when_leaf_is_elsewhere() {
        let r = resolve(&oracle(), &c("UBERON:0001234"), &c("PATO:0000001"), false).unwrap();
        assert_eq!(r, Resolution::AnchorViolation);
        let r = resolve(&oracle(), &c("UBERON:0001234"), &c("PATO:0000001"), true).unwrap();
        assert_eq!(r, Resolution::AnchorViolation);
    }

    #[test]
    fn resolve_anchor_equals_leaf() {
        // Strict ancestry: a class is not its own ancestor, so a leaf bound
        // at the anchor itself fails the precondition.
        let r = resolve(&oracle(), &c("PATO:0000001"), &c("PATO:0000001"), false).unwrap();
        assert_eq!(r, Resolution::AnchorViolation);
        let r = resolve(&oracle(), &c("PATO:0000001"), &c("PATO:0000001"), true).unwrap();
        assert_eq!(r, Resolution::AnchorViolation);
    }

    #[test]
    fn resolve_is_idempotent() {
        let o = oracle();
        let first = resolve(&o, &c("PATO:0000587"), &c("PATO:0000001"), true).unwrap();
        let second = resolve(&o, &c("PATO:0000587"), &c("PATO:0000001"), true).unwrap();
        assert_eq!(first, second);
    }
}
