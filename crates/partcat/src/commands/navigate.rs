//! Read-only tree navigation: breadcrumbs, descendants, nested trees.

use crate::commands::helpers::ancestor_chain;
use crate::error::{Result, TaxonomyError};
use crate::model::{CategoryNode, CategoryTreeNode};
use crate::store::DataStore;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Breadcrumb from the root down to `category_id`, inclusive.
pub fn path<S: DataStore>(store: &S, category_id: &Uuid, max_depth: usize) -> Result<Vec<CategoryNode>> {
    let mut chain = ancestor_chain(store, category_id, max_depth)?;
    chain.reverse();
    Ok(chain)
}

/// Children grouped by parent, each group in sibling order.
struct ChildIndex {
    children: HashMap<Option<Uuid>, Vec<CategoryNode>>,
}

impl ChildIndex {
    fn load<S: DataStore>(store: &S) -> Result<Self> {
        let mut children: HashMap<Option<Uuid>, Vec<CategoryNode>> = HashMap::new();
        for node in store.list_categories()? {
            children.entry(node.parent_id).or_default().push(node);
        }
        for group in children.values_mut() {
            group.sort_by(|a, b| {
                a.sort_order
                    .cmp(&b.sort_order)
                    .then_with(|| a.slug.cmp(&b.slug))
            });
        }
        Ok(Self { children })
    }

    fn of(&self, parent: Option<Uuid>) -> &[CategoryNode] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// `path` is the walk from the starting node down to the parent of `category_id`.
fn cycle_at(category_id: Uuid, path: &[Uuid]) -> TaxonomyError {
    let mut chain = path.to_vec();
    chain.push(category_id);
    TaxonomyError::CyclicTaxonomy { category_id, chain }
}

/// Every descendant of `category_id`, depth-first in sibling order, excluding
/// the category itself.
pub fn descendant_ids<S: DataStore>(store: &S, category_id: &Uuid) -> Result<Vec<Uuid>> {
    store.get_category(category_id)?;
    let index = ChildIndex::load(store)?;

    let mut out = Vec::new();
    let mut visited: HashSet<Uuid> = HashSet::from([*category_id]);
    let mut path: Vec<Uuid> = vec![*category_id];
    let mut stack: Vec<(Uuid, usize)> = index
        .of(Some(*category_id))
        .iter()
        .rev()
        .map(|n| (n.id, 1))
        .collect();

    while let Some((id, depth)) = stack.pop() {
        path.truncate(depth);
        if !visited.insert(id) {
            return Err(cycle_at(id, &path));
        }
        out.push(id);
        path.push(id);
        stack.extend(index.of(Some(id)).iter().rev().map(|n| (n.id, depth + 1)));
    }
    Ok(out)
}

/// Nested tree below `root`, or below every root when `None`.
///
/// `max_depth` limits how many levels below the starting nodes are included:
/// `Some(0)` returns the starting nodes without children, `None` is unbounded.
pub fn tree<S: DataStore>(
    store: &S,
    root: Option<&Uuid>,
    max_depth: Option<usize>,
) -> Result<Vec<CategoryTreeNode>> {
    let index = ChildIndex::load(store)?;
    let starts: Vec<CategoryNode> = match root {
        Some(id) => vec![store.get_category(id)?],
        None => index.of(None).to_vec(),
    };

    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut path: Vec<Uuid> = Vec::new();
    starts
        .into_iter()
        .map(|node| subtree(&index, node, max_depth, &mut visited, &mut path))
        .collect()
}

fn subtree(
    index: &ChildIndex,
    category: CategoryNode,
    max_depth: Option<usize>,
    visited: &mut HashSet<Uuid>,
    path: &mut Vec<Uuid>,
) -> Result<CategoryTreeNode> {
    if !visited.insert(category.id) {
        return Err(cycle_at(category.id, path));
    }
    let depth = path.len();
    let mut children = Vec::new();
    if max_depth.map_or(true, |max| depth < max) {
        path.push(category.id);
        for child in index.of(Some(category.id)) {
            children.push(subtree(index, child.clone(), max_depth, visited, path)?);
        }
        path.pop();
    }
    Ok(CategoryTreeNode { category, children })
}
