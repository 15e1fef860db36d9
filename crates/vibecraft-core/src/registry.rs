use crate::error::{Result, VibecraftError};
use crate::module::Module;
use crate::paths;
use crate::types::ModuleStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ModuleSource
// ---------------------------------------------------------------------------

/// Anything that can hand out the full list of modules of a project.
pub trait ModuleSource {
    fn get_all_modules(&self) -> Result<Vec<Module>>;
}

impl ModuleSource for [Module] {
    fn get_all_modules(&self) -> Result<Vec<Module>> {
        Ok(self.to_vec())
    }
}

impl ModuleSource for Vec<Module> {
    fn get_all_modules(&self) -> Result<Vec<Module>> {
        Ok(self.clone())
    }
}

// ---------------------------------------------------------------------------
// RegistryDocument
// ---------------------------------------------------------------------------

/// On-disk shape of `.vibecraft/modules-registry.json`.
///
/// `dependencies` and `build_order` are reserved: they are kept as-is on
/// rewrite but never populated. Build order is always recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub dependencies: Map<String, Value>,
    #[serde(default)]
    pub build_order: Vec<String>,
}

// ---------------------------------------------------------------------------
// RegistryCache
// ---------------------------------------------------------------------------

/// In-process copy of the registry document.
///
/// Loaded on first read and served until [`RegistryCache::invalidate`].
/// Changes made to the file by another process are invisible until then.
/// Not thread-safe (`RefCell`), which keeps the owning registry `!Sync`.
#[derive(Debug, Default)]
pub struct RegistryCache {
    doc: RefCell<Option<RegistryDocument>>,
}

impl RegistryCache {
    pub fn is_loaded(&self) -> bool {
        self.doc.borrow().is_some()
    }

    pub fn invalidate(&self) {
        self.doc.borrow_mut().take();
    }

    fn store(&self, doc: RegistryDocument) {
        *self.doc.borrow_mut() = Some(doc);
    }

    fn with<T>(&self, f: impl FnOnce(&RegistryDocument) -> T) -> Option<T> {
        self.doc.borrow().as_ref().map(f)
    }
}

// ---------------------------------------------------------------------------
// ModuleUpdate
// ---------------------------------------------------------------------------

/// Partial update for [`ModuleRegistry::update_module`]. `None` fields keep
/// their current value. `name` and `created_at` cannot be changed.
///
/// `metadata` is nullable in the record, so it takes two levels:
/// `Some(None)` clears it and `Some(Some(map))` replaces it.
#[derive(Debug, Clone, Default)]
pub struct ModuleUpdate {
    pub description: Option<String>,
    pub path: Option<String>,
    pub status: Option<ModuleStatus>,
    pub dependencies: Option<Vec<String>>,
    pub exports: Option<Vec<String>>,
    pub phases_completed: Option<Vec<u32>>,
    pub metadata: Option<Option<Map<String, Value>>>,
}

impl ModuleUpdate {
    pub fn status(status: ModuleStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_exports(mut self, exports: Vec<String>) -> Self {
        self.exports = Some(exports);
        self
    }

    pub fn with_dependencies(mut self, deps: Vec<String>) -> Self {
        self.dependencies = Some(deps);
        self
    }

    pub fn with_phases_completed(mut self, phases: Vec<u32>) -> Self {
        self.phases_completed = Some(phases);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(Some(metadata));
        self
    }

    pub fn clear_metadata(mut self) -> Self {
        self.metadata = Some(None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.path.is_none()
            && self.status.is_none()
            && self.dependencies.is_none()
            && self.exports.is_none()
            && self.phases_completed.is_none()
            && self.metadata.is_none()
    }

    fn apply(self, module: &mut Module) {
        if let Some(v) = self.description {
            module.description = v;
        }
        if let Some(v) = self.path {
            module.path = v;
        }
        if let Some(v) = self.status {
            module.status = v;
        }
        if let Some(v) = self.dependencies {
            module.dependencies = v;
        }
        if let Some(v) = self.exports {
            module.exports = v;
        }
        if let Some(v) = self.phases_completed {
            module.phases_completed = v;
        }
        if let Some(v) = self.metadata {
            module.metadata = v;
        }
        module.normalize();
    }
}

// ---------------------------------------------------------------------------
// ModuleRegistry
// ---------------------------------------------------------------------------

/// JSON-backed module store with a write-through cache.
///
/// Designed for one CLI process at a time. There is no file locking: two
/// processes writing the same registry race and the last writer wins.
#[derive(Debug)]
pub struct ModuleRegistry {
    path: PathBuf,
    cache: RegistryCache,
}

impl ModuleRegistry {
    /// Open the registry at `path`, creating an empty one if it is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "creating empty module registry");
            crate::io::write_json(&path, &RegistryDocument::default())?;
        }
        Ok(Self {
            path,
            cache: RegistryCache::default(),
        })
    }

    /// Open `.vibecraft/modules-registry.json` under a project root.
    pub fn for_project(root: &Path) -> Result<Self> {
        Self::open(paths::registry_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cache(&self) -> &RegistryCache {
        &self.cache
    }

    /// Drop the cached document so the next read goes to disk.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    fn load(&self) -> Result<()> {
        if self.cache.is_loaded() {
            return Ok(());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let mut doc: RegistryDocument = serde_json::from_str(&data)?;
        for m in &mut doc.modules {
            m.normalize();
        }
        tracing::debug!(
            path = %self.path.display(),
            modules = doc.modules.len(),
            "loaded module registry"
        );
        self.cache.store(doc);
        Ok(())
    }

    fn with_document<T>(&self, f: impl FnOnce(&RegistryDocument) -> T) -> Result<T> {
        self.load()?;
        self.cache
            .with(f)
            .ok_or_else(|| VibecraftError::Configuration("module registry cache is empty".into()))
    }

    fn document(&self) -> Result<RegistryDocument> {
        self.with_document(|doc| doc.clone())
    }

    /// Disk first, then cache, so a failed write leaves the cache untouched.
    fn write(&mut self, doc: RegistryDocument) -> Result<()> {
        crate::io::write_json(&self.path, &doc)?;
        self.cache.store(doc);
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn get_all_modules(&self) -> Result<Vec<Module>> {
        self.with_document(|doc| doc.modules.clone())
    }

    pub fn get_module(&self, name: &str) -> Result<Option<Module>> {
        self.with_document(|doc| doc.modules.iter().find(|m| m.name == name).cloned())
    }

    pub fn has_module(&self, name: &str) -> Result<bool> {
        self.with_document(|doc| doc.modules.iter().any(|m| m.name == name))
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Add a module. A module with the same name already present is left
    /// untouched and `Ok(false)` is returned.
    pub fn add_module(&mut self, mut module: Module) -> Result<bool> {
        let mut doc = self.document()?;
        if doc.modules.iter().any(|m| m.name == module.name) {
            tracing::debug!(module = %module.name, "module already registered, skipping");
            return Ok(false);
        }
        module.normalize();
        tracing::info!(module = %module.name, "registering module");
        doc.modules.push(module);
        self.write(doc)?;
        Ok(true)
    }

    /// Apply a partial update to an existing module and return the result.
    pub fn update_module(&mut self, name: &str, update: ModuleUpdate) -> Result<Module> {
        let mut doc = self.document()?;
        let module = doc
            .modules
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| VibecraftError::ModuleNotFound(name.to_string()))?;
        update.apply(module);
        let updated = module.clone();
        self.write(doc)?;
        Ok(updated)
    }

    /// Replace a whole record. The stored `created_at` is kept.
    pub fn replace_module(&mut self, mut module: Module) -> Result<()> {
        let mut doc = self.document()?;
        let slot = doc
            .modules
            .iter_mut()
            .find(|m| m.name == module.name)
            .ok_or_else(|| VibecraftError::ModuleNotFound(module.name.clone()))?;
        module.created_at = slot.created_at;
        module.normalize();
        *slot = module;
        self.write(doc)
    }

    pub fn remove_module(&mut self, name: &str) -> Result<()> {
        let mut doc = self.document()?;
        let before = doc.modules.len();
        doc.modules.retain(|m| m.name != name);
        if doc.modules.len() == before {
            return Err(VibecraftError::ModuleNotFound(name.to_string()));
        }
        tracing::info!(module = %name, "removing module from registry");
        self.write(doc)
    }
}

impl ModuleSource for ModuleRegistry {
    fn get_all_modules(&self) -> Result<Vec<Module>> {
        ModuleRegistry::get_all_modules(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
