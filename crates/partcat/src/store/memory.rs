use super::catalog_store::CatalogStore;
use super::mem_backend::MemBackend;

pub type InMemoryStore = CatalogStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        CatalogStore::with_backend(MemBackend::new())
    }

    /// A second store over the same in-memory state.
    pub fn share(&self) -> Self {
        CatalogStore::with_backend(self.backend.clone())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::commands::{build, define, DefineMode, SlugMap};
    use crate::model::{AttributeScope, DataType};
    use crate::spec::{AttributeDef, CategorySpec};
    use uuid::Uuid;

    /// The passive-components branch used throughout the tests:
    ///
    /// ```text
    /// passive-components            (no attributes)
    /// └── resistors                 resistance, tolerance
    ///     ├── carbon-film-resistors
    ///     └── wirewound-resistors   power_rating, tolerance (tighter prefixes)
    /// ```
    pub fn passive_components_tree() -> Vec<CategorySpec> {
        vec![CategorySpec::new("passive-components", "Passive Components", 0, 1)
            .with_description("Passive electronic components without power gain")
            .child(
                CategorySpec::new("resistors", "Resistors", 1, 1)
                    .child(CategorySpec::new(
                        "carbon-film-resistors",
                        "Carbon Film Resistors",
                        2,
                        1,
                    ))
                    .child(CategorySpec::new(
                        "wirewound-resistors",
                        "Wirewound Resistors",
                        2,
                        2,
                    )),
            )]
    }

    pub fn resistor_attributes() -> Vec<AttributeDef> {
        vec![
            AttributeDef::new("resistance", DataType::Decimal, AttributeScope::Component)
                .unit("Ω")
                .prefixes(&["m", "-", "k", "M"])
                .required()
                .label()
                .sort_order(0),
            AttributeDef::new("tolerance", DataType::Decimal, AttributeScope::Both)
                .unit("%")
                .prefixes(&["-", "m", "k"])
                .sort_order(1),
        ]
    }

    pub fn wirewound_attributes() -> Vec<AttributeDef> {
        vec![
            AttributeDef::new("power_rating", DataType::Decimal, AttributeScope::Component)
                .unit("W")
                .prefixes(&["-", "k"])
                .sort_order(0),
            AttributeDef::new("tolerance", DataType::Decimal, AttributeScope::Part)
                .unit("%")
                .prefixes(&["-"])
                .sort_order(1),
        ]
    }

    pub struct StoreFixture {
        pub store: InMemoryStore,
        pub slugs: SlugMap,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
                slugs: SlugMap::new(),
            }
        }

        pub fn with_tree(mut self, specs: &[CategorySpec]) -> Self {
            let built = build::run(&mut self.store, specs, None).unwrap();
            self.slugs.extend(built);
            self
        }

        pub fn with_attributes(mut self, slug: &str, defs: &[AttributeDef]) -> Self {
            let id = self.id(slug);
            define::run(&mut self.store, &id, defs, DefineMode::AllOrNothing).unwrap();
            self
        }

        /// The passive-components tree with resistor and wirewound attributes.
        pub fn passive_components() -> Self {
            Self::new()
                .with_tree(&passive_components_tree())
                .with_attributes("resistors", &resistor_attributes())
                .with_attributes("wirewound-resistors", &wirewound_attributes())
        }

        pub fn id(&self, slug: &str) -> Uuid {
            *self
                .slugs
                .get(slug)
                .unwrap_or_else(|| panic!("fixture has no category '{}'", slug))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::StoreFixture;
    use super::*;
    use crate::store::DataStore;

    #[test]
    fn test_fixture_builds_tree() {
        let fixture = StoreFixture::passive_components();
        assert_eq!(fixture.slugs.len(), 4);
        let all = fixture.store.list_categories().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].slug, "passive-components");
    }

    #[test]
    fn test_shared_store_sees_writes() {
        let fixture = StoreFixture::passive_components();
        let other = fixture.store.share();
        assert!(other.find_category("resistors").unwrap().is_some());
    }
}
