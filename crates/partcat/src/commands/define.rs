//! Attribute definition upserts.
//!
//! Definitions are keyed by `(category, name)`: declaring a name the category
//! already owns updates that definition in place, keeping its id. Declaring a
//! name that an ancestor owns is allowed and creates a shadowing definition on
//! this category; nothing constrains the override to match the ancestor's type.
//!
//! After every call the owner's definitions are renumbered into a contiguous
//! `0..n` order. Definitions sort by their requested `sort_order`; at equal
//! values a definition named in this call goes first, then the previous
//! position decides, then the name. The merge runs inside one
//! [`DataStore::update_definitions`] call, so concurrent defines on the same
//! category each see the other's result, and nothing is written when the call
//! changes nothing.

use crate::attributes::{validate_definition, SiPrefix};
use crate::commands::{DefineMode, DefineReport};
use crate::error::{Result, TaxonomyError};
use crate::model::{AttributeDefinition, CategoryNode};
use crate::spec::AttributeDef;
use crate::store::DataStore;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

type Checked<'a> = (&'a AttributeDef, Vec<SiPrefix>);

pub fn run<S: DataStore>(
    store: &mut S,
    category_id: &Uuid,
    defs: &[AttributeDef],
    mode: DefineMode,
) -> Result<DefineReport> {
    let owner = store.get_category(category_id)?;
    let (valid, failure) = validate_batch(defs);

    match failure {
        None => apply(store, &owner, &valid),
        Some(err) => {
            warn!(category = %owner.slug, ?mode, error = %err, "rejected attribute definition");
            if mode == DefineMode::BestEffort && !valid.is_empty() {
                apply(store, &owner, &valid)?;
            }
            Err(err)
        }
    }
}

/// Validates in call order, stopping at the first failure.
fn validate_batch(defs: &[AttributeDef]) -> (Vec<Checked<'_>>, Option<TaxonomyError>) {
    let mut valid: Vec<Checked<'_>> = Vec::with_capacity(defs.len());
    let mut seen: HashSet<&str> = HashSet::new();

    for def in defs {
        let checked = validate_definition(def).and_then(|prefixes| {
            if seen.contains(def.name.as_str()) {
                Err(TaxonomyError::schema(
                    &def.name,
                    "name",
                    "is declared more than once in one call",
                ))
            } else {
                Ok(prefixes)
            }
        });
        match checked {
            Ok(prefixes) => {
                seen.insert(def.name.as_str());
                valid.push((def, prefixes));
            }
            Err(err) => return (valid, Some(err)),
        }
    }
    (valid, None)
}

struct Slot {
    definition: AttributeDefinition,
    requested: bool,
    key: u32,
    previous: usize,
}

fn apply<S: DataStore>(
    store: &mut S,
    owner: &CategoryNode,
    valid: &[Checked<'_>],
) -> Result<DefineReport> {
    let mut report = DefineReport::default();
    let written = store.update_definitions(&owner.id, |current| {
        let (definitions, dirty, merged) = merge(owner, &current, valid, Utc::now());
        report = merged;
        Ok(dirty.then_some(definitions))
    })?;

    if written {
        info!(
            category = %owner.slug,
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            "defined attributes"
        );
    } else {
        debug!(
            category = %owner.slug,
            total = report.total(),
            "attribute definitions already up to date"
        );
    }
    Ok(report)
}

/// Folds `valid` into the stored set. Returns the renumbered set, whether it
/// differs from `current`, and the per-name outcome.
fn merge(
    owner: &CategoryNode,
    current: &[AttributeDefinition],
    valid: &[Checked<'_>],
    now: DateTime<Utc>,
) -> (Vec<AttributeDefinition>, bool, DefineReport) {
    let mut slots: Vec<Slot> = current
        .iter()
        .enumerate()
        .map(|(i, d)| Slot {
            definition: d.clone(),
            requested: false,
            key: d.sort_order,
            previous: i,
        })
        .collect();

    for (def, prefixes) in valid {
        match slots.iter_mut().find(|s| s.definition.name == def.name) {
            Some(slot) => {
                let id = slot.definition.id;
                let created_at = slot.definition.created_at;
                let updated_at = slot.definition.updated_at;
                slot.definition = declared(def, prefixes, id, owner.id, created_at, updated_at);
                slot.requested = true;
                slot.key = def.sort_order;
            }
            None => slots.push(Slot {
                definition: declared(def, prefixes, Uuid::new_v4(), owner.id, now, now),
                requested: true,
                key: def.sort_order,
                previous: usize::MAX,
            }),
        }
    }

    slots.sort_by(|a, b| {
        a.key
            .cmp(&b.key)
            .then_with(|| b.requested.cmp(&a.requested))
            .then_with(|| a.previous.cmp(&b.previous))
            .then_with(|| a.definition.name.cmp(&b.definition.name))
    });

    let previous: HashMap<&str, &AttributeDefinition> =
        current.iter().map(|d| (d.name.as_str(), d)).collect();
    let mut dirty = false;
    let mut definitions: Vec<AttributeDefinition> = Vec::with_capacity(slots.len());
    for (position, slot) in slots.into_iter().enumerate() {
        let mut definition = slot.definition;
        definition.sort_order = position as u32;
        match previous.get(definition.name.as_str()) {
            Some(before) if before.same_declaration(&definition) => {}
            Some(_) => {
                definition.updated_at = now;
                dirty = true;
            }
            None => dirty = true,
        }
        definitions.push(definition);
    }

    let mut report = DefineReport::default();
    for (def, _) in valid {
        let name = def.name.clone();
        match previous.get(def.name.as_str()) {
            None => report.created.push(name),
            Some(before) => {
                let unchanged = definitions
                    .iter()
                    .find(|d| d.name == def.name)
                    .is_some_and(|d| before.same_declaration(d));
                if unchanged {
                    report.unchanged.push(name);
                } else {
                    report.updated.push(name);
                }
            }
        }
    }
    (definitions, dirty, report)
}

fn declared(
    def: &AttributeDef,
    prefixes: &[SiPrefix],
    id: Uuid,
    category_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> AttributeDefinition {
    AttributeDefinition {
        id,
        category_id,
        name: def.name.clone(),
        display_name: def.display_name.clone(),
        data_type: def.data_type,
        scope: def.scope,
        unit: def.unit.clone(),
        allowed_prefixes: prefixes.to_vec(),
        allowed_values: def.allowed_values.clone(),
        is_filterable: def.is_filterable,
        is_required: def.is_required,
        is_label: def.is_label,
        sort_order: def.sort_order,
        created_at,
        updated_at,
    }
}
