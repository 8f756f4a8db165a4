//! Set difference between two materialized link sets.

use std::collections::BTreeSet;

use pds_types::{LinkExpression, PerspectiveDiff};

/// What changed going from `old` to `new`.
///
/// Links only in `new` are additions and links only in `old` are removals.
/// Both lists come out sorted.
pub fn diff_perspectives(
    old: &BTreeSet<LinkExpression>,
    new: &BTreeSet<LinkExpression>,
) -> PerspectiveDiff {
    PerspectiveDiff::new(
        new.difference(old).cloned().collect(),
        old.difference(new).cloned().collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{link, links};

    fn set(sources: &[&str]) -> BTreeSet<LinkExpression> {
        links(sources).into_iter().collect()
    }

    #[test]
    fn identical_sets_no_diff() {
        let s = set(&["a", "b"]);
        assert!(diff_perspectives(&s, &s).is_empty());
    }

    #[test]
    fn empty_to_populated() {
        let diff = diff_perspectives(&BTreeSet::new(), &set(&["a", "b"]));
        assert_eq!(diff.additions.len(), 2);
        assert!(diff.removals.is_empty());
    }

    #[test]
    fn mixed_changes() {
        let diff = diff_perspectives(&set(&["a", "b"]), &set(&["b", "c"]));
        assert_eq!(diff.additions, vec![link("c")]);
        assert_eq!(diff.removals, vec![link("a")]);
    }
}
