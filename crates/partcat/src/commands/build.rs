//! Materializes a nested [`CategorySpec`] forest into the store.
//!
//! The build runs in three passes:
//!
//! 1. **Plan**: flatten the forest depth-first, checking levels and rejecting a
//!    slug declared under two different parents. A slug repeated under the same
//!    parent is merged, the later declaration winning.
//! 2. **Resolve**: match every slug against the store. Existing nodes keep their
//!    id and `created_at`; only nodes whose content differs are rewritten.
//! 3. **Write**: shift the levels of stored descendants the forest leaves out
//!    when their ancestor moves to another level, check that the resulting
//!    parent links stay acyclic, then upsert the changed nodes in one batch.
//!    The store matches slugs again inside the write, so two builds racing to
//!    create the same slug converge on one id.
//!
//! Validation happens before the write, and the write itself is atomic, so a
//! failed build leaves the store untouched. Running the same build twice
//! produces the same ids and rewrites nothing.

use crate::commands::SlugMap;
use crate::error::{Result, TaxonomyError};
use crate::model::{CategoryNode, LocalizedText};
use crate::spec::CategorySpec;
use crate::store::DataStore;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParentRef {
    Root,
    Existing(Uuid),
    Declared(String),
}

impl ParentRef {
    fn describe(&self) -> String {
        match self {
            ParentRef::Root => "<root>".to_string(),
            ParentRef::Existing(id) => id.to_string(),
            ParentRef::Declared(slug) => format!("'{}'", slug),
        }
    }
}

struct Planned {
    slug: String,
    name: LocalizedText,
    description: Option<LocalizedText>,
    level: u32,
    sort_order: u32,
    parent: ParentRef,
}

#[derive(Default)]
struct Plan {
    nodes: Vec<Planned>,
    index: HashMap<String, usize>,
}

impl Plan {
    fn add(&mut self, spec: &CategorySpec, parent: ParentRef, parent_level: Option<u32>) -> Result<()> {
        if let Some(parent_level) = parent_level {
            let expected = parent_level + 1;
            if spec.level != expected {
                return Err(TaxonomyError::LevelMismatch {
                    slug: spec.slug.clone(),
                    expected,
                    found: spec.level,
                });
            }
        }

        let planned = Planned {
            slug: spec.slug.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            level: spec.level,
            sort_order: spec.sort_order,
            parent,
        };

        match self.index.get(&spec.slug) {
            Some(&i) => {
                if self.nodes[i].parent != planned.parent {
                    return Err(TaxonomyError::DuplicateSlug {
                        slug: spec.slug.clone(),
                        first_parent: self.nodes[i].parent.describe(),
                        second_parent: planned.parent.describe(),
                    });
                }
                debug!(slug = %spec.slug, "slug declared twice under one parent, later wins");
                self.nodes[i] = planned;
            }
            None => {
                self.index.insert(spec.slug.clone(), self.nodes.len());
                self.nodes.push(planned);
            }
        }

        for child in &spec.children {
            self.add(child, ParentRef::Declared(spec.slug.clone()), Some(spec.level))?;
        }
        Ok(())
    }
}

/// Builds `specs` as a forest of roots, or under `parent_id` when given.
///
/// Returns the id of every slug in the forest, nested ones included.
pub fn run<S: DataStore>(
    store: &mut S,
    specs: &[CategorySpec],
    parent_id: Option<&Uuid>,
) -> Result<SlugMap> {
    let plan = plan_forest(store, specs, parent_id).inspect_err(|e| {
        warn!(error = %e, "rejected category build");
    })?;

    // Resolve every slug to an id, reusing stored ones.
    let mut ids: HashMap<&str, Uuid> = HashMap::with_capacity(plan.nodes.len());
    let mut existing: HashMap<&str, CategoryNode> = HashMap::new();
    for planned in &plan.nodes {
        match store.find_category(&planned.slug)? {
            Some(node) => {
                ids.insert(planned.slug.as_str(), node.id);
                existing.insert(planned.slug.as_str(), node);
            }
            None => {
                ids.insert(planned.slug.as_str(), Uuid::new_v4());
            }
        }
    }

    let now = Utc::now();
    let mut batch: Vec<CategoryNode> = Vec::new();
    let mut created = 0usize;
    let mut unchanged = 0usize;
    for planned in &plan.nodes {
        let id = lookup(&ids, &planned.slug)?;
        let parent = match &planned.parent {
            ParentRef::Root => None,
            ParentRef::Existing(id) => Some(*id),
            ParentRef::Declared(slug) => Some(lookup(&ids, slug)?),
        };

        match existing.get(planned.slug.as_str()) {
            Some(previous) => {
                let mut node = previous.clone();
                node.name = planned.name.clone();
                node.description = planned.description.clone();
                node.parent_id = parent;
                node.level = planned.level;
                node.sort_order = planned.sort_order;
                if node == *previous {
                    unchanged += 1;
                } else {
                    node.updated_at = now;
                    debug!(slug = %node.slug, id = %node.id, "updating category");
                    batch.push(node);
                }
            }
            None => {
                created += 1;
                debug!(slug = %planned.slug, %id, "creating category");
                batch.push(CategoryNode {
                    id,
                    slug: planned.slug.clone(),
                    name: planned.name.clone(),
                    description: planned.description.clone(),
                    parent_id: parent,
                    level: planned.level,
                    sort_order: planned.sort_order,
                    created_at: now,
                    updated_at: now,
                });
            }
        }
    }

    let planned_ids: HashSet<Uuid> = ids.values().copied().collect();
    let shifted = shift_descendant_levels(store, &mut batch, &existing, &planned_ids, now)?;

    check_acyclic(store, &batch).inspect_err(|e| {
        warn!(error = %e, "rejected category build");
    })?;
    let updated = batch.len() - created - shifted;
    for node in store.upsert_categories(batch)? {
        if let Some(id) = ids.get_mut(node.slug.as_str()) {
            *id = node.id;
        }
    }

    info!(created, updated, shifted, unchanged, "built category tree");

    Ok(plan
        .nodes
        .iter()
        .filter_map(|p| ids.get(p.slug.as_str()).map(|id| (p.slug.clone(), *id)))
        .collect())
}

fn plan_forest<S: DataStore>(
    store: &S,
    specs: &[CategorySpec],
    parent_id: Option<&Uuid>,
) -> Result<Plan> {
    let (parent, parent_level) = match parent_id {
        Some(id) => {
            let node = store.get_category(id)?;
            (ParentRef::Existing(node.id), Some(node.level))
        }
        None => (ParentRef::Root, None),
    };

    let mut plan = Plan::default();
    for spec in specs {
        plan.add(spec, parent.clone(), parent_level)?;
    }
    Ok(plan)
}

fn lookup(ids: &HashMap<&str, Uuid>, slug: &str) -> Result<Uuid> {
    ids.get(slug)
        .copied()
        .ok_or_else(|| TaxonomyError::CategoryNotFound(slug.to_string()))
}

/// Moves the stored descendants a build leaves out along with their re-leveled
/// ancestor, so every child stays one level below its parent.
///
/// Returns how many nodes were appended to `batch`.
fn shift_descendant_levels<S: DataStore>(
    store: &S,
    batch: &mut Vec<CategoryNode>,
    existing: &HashMap<&str, CategoryNode>,
    planned: &HashSet<Uuid>,
    now: DateTime<Utc>,
) -> Result<usize> {
    let mut queue: VecDeque<(Uuid, u32)> = batch
        .iter()
        .filter(|n| existing.get(n.slug.as_str()).is_some_and(|p| p.level != n.level))
        .map(|n| (n.id, n.level))
        .collect();
    if queue.is_empty() {
        return Ok(0);
    }

    let mut children: HashMap<Uuid, Vec<CategoryNode>> = HashMap::new();
    for node in store.list_categories()? {
        if let Some(parent) = node.parent_id {
            children.entry(parent).or_default().push(node);
        }
    }

    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut shifted = 0usize;
    while let Some((id, level)) = queue.pop_front() {
        for child in children.get(&id).map(Vec::as_slice).unwrap_or(&[]) {
            // Planned nodes carry their own, already checked, level.
            if planned.contains(&child.id) || !visited.insert(child.id) {
                continue;
            }
            let expected = level + 1;
            if child.level != expected {
                debug!(
                    slug = %child.slug,
                    from = child.level,
                    to = expected,
                    "shifting category level"
                );
                let mut node = child.clone();
                node.level = expected;
                node.updated_at = now;
                batch.push(node);
                shifted += 1;
            }
            queue.push_back((child.id, expected));
        }
    }
    Ok(shifted)
}

/// Walks every pending node to a root over the post-write parent links.
fn check_acyclic<S: DataStore>(store: &S, batch: &[CategoryNode]) -> Result<()> {
    let pending: HashMap<Uuid, Option<Uuid>> =
        batch.iter().map(|n| (n.id, n.parent_id)).collect();
    let mut grounded: HashSet<Uuid> = HashSet::new();

    for node in batch {
        let mut path: Vec<Uuid> = Vec::new();
        let mut on_path: HashSet<Uuid> = HashSet::new();
        let mut current = Some(node.id);

        while let Some(id) = current {
            if grounded.contains(&id) {
                break;
            }
            path.push(id);
            if !on_path.insert(id) {
                return Err(TaxonomyError::CyclicTaxonomy {
                    category_id: node.id,
                    chain: path,
                });
            }
            current = match pending.get(&id) {
                Some(parent) => *parent,
                None => store.get_category(&id)?.parent_id,
            };
        }
        grounded.extend(path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::passive_components_tree;
    use crate::store::InMemoryStore;

    fn build(store: &mut InMemoryStore, specs: &[CategorySpec]) -> Result<SlugMap> {
        run(store, specs, None)
    }

    #[test]
    fn test_builds_nested_forest() {
        let mut store = InMemoryStore::new();
        let slugs = build(&mut store, &passive_components_tree()).unwrap();
        assert_eq!(slugs.len(), 4);

        let root = store.get_category(&slugs["passive-components"]).unwrap();
        assert!(root.is_root());
        assert_eq!(
            root.description.as_ref().and_then(|d| d.get("en")),
            Some("Passive electronic components without power gain")
        );

        let wirewound = store.get_category(&slugs["wirewound-resistors"]).unwrap();
        assert_eq!(wirewound.parent_id, Some(slugs["resistors"]));
        assert_eq!(wirewound.level, 2);

        let children: Vec<_> = store
            .list_children(Some(&slugs["resistors"]))
            .unwrap()
            .into_iter()
            .map(|n| n.slug)
            .collect();
        assert_eq!(children, vec!["carbon-film-resistors", "wirewound-resistors"]);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut store = InMemoryStore::new();
        let first = build(&mut store, &passive_components_tree()).unwrap();
        let before = store.list_categories().unwrap();

        let second = build(&mut store, &passive_components_tree()).unwrap();
        let after = store.list_categories().unwrap();

        assert_eq!(first, second);
        assert_eq!(before, after);
    }

    #[test]
    fn test_rebuild_updates_in_place() {
        let mut store = InMemoryStore::new();
        let first = build(&mut store, &passive_components_tree()).unwrap();
        let before = store.get_category(&first["resistors"]).unwrap();

        let mut specs = passive_components_tree();
        specs[0].children[0].name = LocalizedText::en("Fixed Resistors");
        let second = build(&mut store, &specs).unwrap();

        let after = store.get_category(&second["resistors"]).unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.name.get("en"), Some("Fixed Resistors"));
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(store.list_categories().unwrap().len(), 4);
    }

    #[test]
    fn test_duplicate_slug_under_different_parents() {
        let mut store = InMemoryStore::new();
        let specs = vec![
            CategorySpec::new("passives", "Passives", 0, 0)
                .child(CategorySpec::new("ferrites", "Ferrites", 1, 0)),
            CategorySpec::new("magnetics", "Magnetics", 0, 1)
                .child(CategorySpec::new("ferrites", "Ferrites", 1, 0)),
        ];
        let err = build(&mut store, &specs).unwrap_err();
        match err {
            TaxonomyError::DuplicateSlug {
                slug,
                first_parent,
                second_parent,
            } => {
                assert_eq!(slug, "ferrites");
                assert_eq!(first_parent, "'passives'");
                assert_eq!(second_parent, "'magnetics'");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.list_categories().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_slug_under_same_parent_merges() {
        let mut store = InMemoryStore::new();
        let specs = vec![CategorySpec::new("passives", "Passives", 0, 0)
            .child(CategorySpec::new("ferrites", "Ferrites", 1, 0))
            .child(CategorySpec::new("ferrites", "Ferrite Beads", 1, 3))];
        let slugs = build(&mut store, &specs).unwrap();
        assert_eq!(slugs.len(), 2);
        let node = store.get_category(&slugs["ferrites"]).unwrap();
        assert_eq!(node.name.get("en"), Some("Ferrite Beads"));
        assert_eq!(node.sort_order, 3);
    }

    #[test]
    fn test_level_mismatch_writes_nothing() {
        let mut store = InMemoryStore::new();
        let specs = vec![CategorySpec::new("passives", "Passives", 0, 0)
            .child(CategorySpec::new("resistors", "Resistors", 1, 0))
            .child(CategorySpec::new("capacitors", "Capacitors", 2, 1))];
        let err = build(&mut store, &specs).unwrap_err();
        assert!(matches!(
            err,
            TaxonomyError::LevelMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
        assert!(store.list_categories().unwrap().is_empty());
    }

    #[test]
    fn test_build_under_existing_parent() {
        let mut store = InMemoryStore::new();
        let slugs = build(&mut store, &passive_components_tree()).unwrap();
        let resistors = slugs["resistors"];

        let added = run(
            &mut store,
            &[CategorySpec::new("thick-film-resistors", "Thick Film", 2, 3)],
            Some(&resistors),
        )
        .unwrap();
        let node = store.get_category(&added["thick-film-resistors"]).unwrap();
        assert_eq!(node.parent_id, Some(resistors));

        let err = run(
            &mut store,
            &[CategorySpec::new("metal-film-resistors", "Metal Film", 1, 4)],
            Some(&resistors),
        )
        .unwrap_err();
        assert!(matches!(err, TaxonomyError::LevelMismatch { expected: 2, .. }));
    }

    #[test]
    fn test_unknown_parent() {
        let mut store = InMemoryStore::new();
        let err = run(
            &mut store,
            &[CategorySpec::new("x", "X", 1, 0)],
            Some(&Uuid::new_v4()),
        )
        .unwrap_err();
        assert!(matches!(err, TaxonomyError::CategoryNotFound(_)));
    }

    #[test]
    fn test_reparent_moves_existing_node() {
        let mut store = InMemoryStore::new();
        let roots = build(
            &mut store,
            &[
                CategorySpec::new("passives", "Passives", 0, 0),
                CategorySpec::new("actives", "Actives", 0, 1),
            ],
        )
        .unwrap();
        let first = run(
            &mut store,
            &[CategorySpec::new("crystals", "Crystals", 1, 0)],
            Some(&roots["passives"]),
        )
        .unwrap();
        let second = run(
            &mut store,
            &[CategorySpec::new("crystals", "Crystals", 1, 0)],
            Some(&roots["actives"]),
        )
        .unwrap();

        assert_eq!(first["crystals"], second["crystals"]);
        let node = store.get_category(&second["crystals"]).unwrap();
        assert_eq!(node.parent_id, Some(roots["actives"]));
        assert!(store.list_children(Some(&roots["passives"])).unwrap().is_empty());
    }

    fn assert_levels_consistent(store: &InMemoryStore) {
        for node in store.list_categories().unwrap() {
            if let Some(parent_id) = node.parent_id {
                let parent = store.get_category(&parent_id).unwrap();
                assert_eq!(
                    node.level,
                    parent.level + 1,
                    "{} at level {} under {} at level {}",
                    node.slug,
                    node.level,
                    parent.slug,
                    parent.level
                );
            }
        }
    }

    #[test]
    fn test_reparent_shifts_stored_descendants() {
        let mut store = InMemoryStore::new();
        let slugs = build(
            &mut store,
            &[
                CategorySpec::new("passives", "Passives", 0, 0).child(
                    CategorySpec::new("crystals", "Crystals", 1, 0).child(
                        CategorySpec::new("quartz", "Quartz", 2, 0)
                            .child(CategorySpec::new("at-cut", "AT-Cut", 3, 0)),
                    ),
                ),
                CategorySpec::new("actives", "Actives", 0, 1)
                    .child(CategorySpec::new("discrete", "Discrete", 1, 0)),
            ],
        )
        .unwrap();
        let quartz_before = store.get_category(&slugs["quartz"]).unwrap();

        run(
            &mut store,
            &[CategorySpec::new("crystals", "Crystals", 2, 0)],
            Some(&slugs["discrete"]),
        )
        .unwrap();

        let quartz = store.get_category(&slugs["quartz"]).unwrap();
        assert_eq!(quartz.level, 3);
        assert_eq!(quartz.parent_id, Some(slugs["crystals"]));
        assert_eq!(quartz.created_at, quartz_before.created_at);
        assert_eq!(store.get_category(&slugs["at-cut"]).unwrap().level, 4);
        assert_levels_consistent(&store);
    }

    #[test]
    fn test_reparent_to_root_shifts_descendants_up() {
        let mut store = InMemoryStore::new();
        let slugs = build(&mut store, &passive_components_tree()).unwrap();

        run(&mut store, &[CategorySpec::new("resistors", "Resistors", 0, 2)], None).unwrap();

        assert!(store.get_category(&slugs["resistors"]).unwrap().is_root());
        assert_eq!(store.get_category(&slugs["wirewound-resistors"]).unwrap().level, 1);
        assert_eq!(store.get_category(&slugs["carbon-film-resistors"]).unwrap().level, 1);
        assert_levels_consistent(&store);
    }

    #[test]
    fn test_reparent_keeps_levels_the_forest_declares() {
        let mut store = InMemoryStore::new();
        let slugs = build(&mut store, &passive_components_tree()).unwrap();
        let wirewound_before = store.get_category(&slugs["wirewound-resistors"]).unwrap();

        // The forest re-declares one child; the other is shifted from storage.
        run(
            &mut store,
            &[CategorySpec::new("resistors", "Resistors", 0, 2).child(CategorySpec::new(
                "wirewound-resistors",
                "Wirewound Resistors",
                1,
                2,
            ))],
            None,
        )
        .unwrap();

        let wirewound = store.get_category(&slugs["wirewound-resistors"]).unwrap();
        assert_eq!(wirewound.id, wirewound_before.id);
        assert_eq!(wirewound.level, 1);
        assert_levels_consistent(&store);
    }

    #[test]
    fn test_reparent_into_own_subtree_is_rejected() {
        let mut store = InMemoryStore::new();
        let slugs = build(&mut store, &passive_components_tree()).unwrap();
        let before = store.list_categories().unwrap();

        // Hang the root below its own grandchild.
        let err = run(
            &mut store,
            &[CategorySpec::new("passive-components", "Passive Components", 3, 1)],
            Some(&slugs["wirewound-resistors"]),
        )
        .unwrap_err();
        assert!(matches!(err, TaxonomyError::CyclicTaxonomy { .. }));
        assert_eq!(store.list_categories().unwrap(), before);
    }

    #[test]
    fn test_failed_write_applies_nothing() {
        let mut store = InMemoryStore::new();
        store.backend().set_simulate_write_error(true);
        let err = build(&mut store, &passive_components_tree()).unwrap_err();
        assert!(matches!(err, TaxonomyError::Store(_)));
        store.backend().set_simulate_write_error(false);
        assert!(store.list_categories().unwrap().is_empty());
    }

    #[test]
    fn test_empty_forest() {
        let mut store = InMemoryStore::new();
        assert!(build(&mut store, &[]).unwrap().is_empty());
    }
}
