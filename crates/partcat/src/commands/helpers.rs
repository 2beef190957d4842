use crate::error::{Result, TaxonomyError};
use crate::model::CategoryNode;
use crate::store::DataStore;
use std::collections::HashSet;
use uuid::Uuid;

/// Walks from `category_id` up to its root and returns `[self, parent, .., root]`.
///
/// A revisited id ends the walk with [`TaxonomyError::CyclicTaxonomy`]. The walk
/// also stops with [`TaxonomyError::DepthLimitExceeded`] once more than
/// `max_depth` ancestors sit above the category. A dangling parent reference
/// surfaces as [`TaxonomyError::CategoryNotFound`].
pub fn ancestor_chain<S: DataStore>(
    store: &S,
    category_id: &Uuid,
    max_depth: usize,
) -> Result<Vec<CategoryNode>> {
    let mut chain: Vec<CategoryNode> = Vec::new();
    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut current = Some(*category_id);

    while let Some(id) = current {
        if !visited.insert(id) {
            let mut walked: Vec<Uuid> = chain.iter().map(|n| n.id).collect();
            walked.push(id);
            return Err(TaxonomyError::CyclicTaxonomy {
                category_id: *category_id,
                chain: walked,
            });
        }
        if chain.len() > max_depth {
            return Err(TaxonomyError::DepthLimitExceeded {
                category_id: *category_id,
                limit: max_depth,
            });
        }
        let node = store.get_category(&id)?;
        current = node.parent_id;
        chain.push(node);
    }

    Ok(chain)
}

/// Checks that `requested` names every member of `current` exactly once.
pub(crate) fn check_permutation(owner: &str, current: &[&str], requested: &[&str]) -> Result<()> {
    let current_set: HashSet<&str> = current.iter().copied().collect();
    let mut seen: HashSet<&str> = HashSet::new();

    let mut duplicated = Vec::new();
    let mut unknown = Vec::new();
    for &name in requested {
        if !seen.insert(name) {
            if !duplicated.iter().any(|d: &String| d.as_str() == name) {
                duplicated.push(name.to_string());
            }
        } else if !current_set.contains(name) {
            unknown.push(name.to_string());
        }
    }
    let missing: Vec<String> = current
        .iter()
        .filter(|name| !seen.contains(*name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() && unknown.is_empty() && duplicated.is_empty() {
        return Ok(());
    }
    Err(TaxonomyError::InvalidReorderSet {
        owner: owner.to_string(),
        missing,
        unknown,
        duplicated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocalizedText;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::InMemoryStore;

    #[test]
    fn test_chain_is_self_first() {
        let fixture = StoreFixture::passive_components();
        let chain = ancestor_chain(&fixture.store, &fixture.id("wirewound-resistors"), 64).unwrap();
        let slugs: Vec<_> = chain.iter().map(|n| n.slug.as_str()).collect();
        assert_eq!(
            slugs,
            vec!["wirewound-resistors", "resistors", "passive-components"]
        );
    }

    #[test]
    fn test_root_chain_is_just_self() {
        let fixture = StoreFixture::passive_components();
        let chain = ancestor_chain(&fixture.store, &fixture.id("passive-components"), 64).unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_cycle_is_reported() {
        let store = InMemoryStore::new();
        let mut a = CategoryNode::new("a", LocalizedText::en("A"), 0);
        let mut b = CategoryNode::new("b", LocalizedText::en("B"), 1);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        store.backend().insert_raw_category(a.clone()).unwrap();
        store.backend().insert_raw_category(b.clone()).unwrap();

        let err = ancestor_chain(&store, &a.id, 64).unwrap_err();
        match err {
            TaxonomyError::CyclicTaxonomy { category_id, chain } => {
                assert_eq!(category_id, a.id);
                assert_eq!(chain, vec![a.id, b.id, a.id]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_depth_limit() {
        let fixture = StoreFixture::passive_components();
        let id = fixture.id("wirewound-resistors");
        // Two ancestors above the leaf.
        assert!(ancestor_chain(&fixture.store, &id, 2).is_ok());
        let err = ancestor_chain(&fixture.store, &id, 1).unwrap_err();
        assert!(matches!(
            err,
            TaxonomyError::DepthLimitExceeded { limit: 1, .. }
        ));
    }

    #[test]
    fn test_dangling_parent() {
        let store = InMemoryStore::new();
        let mut orphan = CategoryNode::new("orphan", LocalizedText::en("Orphan"), 1);
        orphan.parent_id = Some(Uuid::new_v4());
        store.backend().insert_raw_category(orphan.clone()).unwrap();
        let err = ancestor_chain(&store, &orphan.id, 64).unwrap_err();
        assert!(matches!(err, TaxonomyError::CategoryNotFound(_)));
    }

    #[test]
    fn test_permutation_accepts_full_set() {
        assert!(check_permutation("x", &["a", "b"], &["b", "a"]).is_ok());
        assert!(check_permutation("x", &[], &[]).is_ok());
    }

    #[test]
    fn test_permutation_reports_every_problem() {
        let err = check_permutation("cat", &["a", "b", "c"], &["a", "a", "z"]).unwrap_err();
        match err {
            TaxonomyError::InvalidReorderSet {
                owner,
                missing,
                unknown,
                duplicated,
            } => {
                assert_eq!(owner, "cat");
                assert_eq!(missing, vec!["b", "c"]);
                assert_eq!(unknown, vec!["z"]);
                assert_eq!(duplicated, vec!["a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
