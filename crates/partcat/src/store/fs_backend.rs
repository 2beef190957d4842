use super::backend::{check_slug_uniqueness, rebind_to_stored_ids, StorageBackend};
use super::catalog_store::CatalogStore;
use crate::error::{Result, TaxonomyError};
use crate::model::{AttributeDefinition, CategoryNode};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub type FileStore = CatalogStore<FsBackend>;

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        CatalogStore::with_backend(FsBackend::new(root))
    }
}

/// JSON-file storage backend.
///
/// Every file is replaced with write-to-temp + rename, so a reader sees the
/// previous file or the new one. Read-modify-write cycles on `categories.json`
/// and on the definition files are serialized within the process; the backend
/// assumes a single writing process per data directory.
pub struct FsBackend {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn categories_file(&self) -> PathBuf {
        self.root.join("categories.json")
    }

    fn attributes_dir(&self) -> PathBuf {
        self.root.join("attributes")
    }

    fn definitions_file(&self, category_id: &Uuid) -> PathBuf {
        self.attributes_dir().join(format!("{}.json", category_id))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(TaxonomyError::Io)?;
        }
        Ok(())
    }

    fn read_category_map(&self) -> Result<HashMap<Uuid, CategoryNode>> {
        let file = self.categories_file();
        if !file.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(file).map_err(TaxonomyError::Io)?;
        let map: HashMap<Uuid, CategoryNode> =
            serde_json::from_str(&content).map_err(TaxonomyError::Serialization)?;
        Ok(map)
    }

    fn write_atomic(&self, dir: &Path, target: &Path, content: String) -> Result<()> {
        self.ensure_dir(dir)?;
        let tmp_file = dir.join(format!(".partcat-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(TaxonomyError::Io)?;
        fs::rename(&tmp_file, target).map_err(TaxonomyError::Io)?;
        Ok(())
    }

    /// Writes `nodes` over `map`. Callers hold the write lock.
    fn write_categories(
        &self,
        mut map: HashMap<Uuid, CategoryNode>,
        nodes: &[CategoryNode],
    ) -> Result<()> {
        let slug_owners: HashMap<&str, Uuid> =
            map.values().map(|n| (n.slug.as_str(), n.id)).collect();
        check_slug_uniqueness(nodes, |slug| slug_owners.get(slug).copied())?;

        for node in nodes {
            map.insert(node.id, node.clone());
        }

        let content = serde_json::to_string_pretty(&map).map_err(TaxonomyError::Serialization)?;
        self.write_atomic(&self.root, &self.categories_file(), content)?;
        debug!(count = nodes.len(), root = %self.root.display(), "saved categories");
        Ok(())
    }

    /// Callers hold the write lock.
    fn write_definitions(&self, category_id: &Uuid, definitions: &[AttributeDefinition]) -> Result<()> {
        let content =
            serde_json::to_string_pretty(definitions).map_err(TaxonomyError::Serialization)?;
        self.write_atomic(
            &self.attributes_dir(),
            &self.definitions_file(category_id),
            content,
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| TaxonomyError::Store("file backend lock poisoned".to_string()))
    }
}

impl StorageBackend for FsBackend {
    fn load_categories(&self) -> Result<Vec<CategoryNode>> {
        Ok(self.read_category_map()?.into_values().collect())
    }

    fn load_category(&self, id: &Uuid) -> Result<Option<CategoryNode>> {
        Ok(self.read_category_map()?.remove(id))
    }

    fn find_category_by_slug(&self, slug: &str) -> Result<Option<CategoryNode>> {
        Ok(self
            .read_category_map()?
            .into_values()
            .find(|node| node.slug == slug))
    }

    fn save_categories(&self, nodes: &[CategoryNode]) -> Result<()> {
        let _guard = self.lock()?;
        let map = self.read_category_map()?;
        self.write_categories(map, nodes)
    }

    fn upsert_categories(&self, mut nodes: Vec<CategoryNode>) -> Result<Vec<CategoryNode>> {
        let _guard = self.lock()?;
        let map = self.read_category_map()?;
        {
            let by_slug: HashMap<&str, &CategoryNode> =
                map.values().map(|n| (n.slug.as_str(), n)).collect();
            rebind_to_stored_ids(&mut nodes, |slug| by_slug.get(slug).map(|n| (*n).clone()));
        }
        self.write_categories(map, &nodes)?;
        Ok(nodes)
    }

    fn load_definitions(&self, category_id: &Uuid) -> Result<Vec<AttributeDefinition>> {
        let file = self.definitions_file(category_id);
        if !file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(file).map_err(TaxonomyError::Io)?;
        let definitions: Vec<AttributeDefinition> =
            serde_json::from_str(&content).map_err(TaxonomyError::Serialization)?;
        Ok(definitions)
    }

    fn save_definitions(
        &self,
        category_id: &Uuid,
        definitions: &[AttributeDefinition],
    ) -> Result<()> {
        let _guard = self.lock()?;
        self.write_definitions(category_id, definitions)
    }

    fn update_definitions<F>(&self, category_id: &Uuid, update: F) -> Result<bool>
    where
        F: FnOnce(Vec<AttributeDefinition>) -> Result<Option<Vec<AttributeDefinition>>>,
    {
        let _guard = self.lock()?;
        let current = self.load_definitions(category_id)?;
        match update(current)? {
            Some(definitions) => {
                self.write_definitions(category_id, &definitions)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
