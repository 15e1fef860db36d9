use crate::config::Config;
use crate::error::{Result, VibecraftError};
use crate::module::Module;
use crate::paths;
use crate::plan::PlannedModule;
use crate::registry::{ModuleRegistry, ModuleUpdate};
use crate::types::ModuleStatus;
use crate::validation;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of [`ModuleManager::import_planned`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub created: Vec<Module>,
    pub skipped: Vec<SkippedModule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedModule {
    pub name: String,
    pub reason: String,
}

/// Create, inspect and retire modules of one project.
///
/// Every module has two records: the registry entry, which the dependency
/// analyzer reads, and `<modules_dir>/<name>/.module.json` next to the
/// module's files. Both are written on create and on phase completion.
#[derive(Debug)]
pub struct ModuleManager {
    root: PathBuf,
    config: Config,
    registry: ModuleRegistry,
}

impl ModuleManager {
    pub fn new(root: &Path) -> Result<Self> {
        let config = Config::load(root)?;
        Self::with_config(root, config)
    }

    pub fn with_config(root: &Path, config: Config) -> Result<Self> {
        crate::io::ensure_dir(&config.modules_path(root))?;
        let registry = ModuleRegistry::for_project(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            registry,
        })
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn module_dir(&self, name: &str) -> PathBuf {
        self.config.modules_path(&self.root).join(name)
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Dependencies are stored as given. They may name modules that do not
    /// exist yet; `integrate analyze` reports the ones that never appear.
    ///
    /// A module directory left behind by [`remove_module`](Self::remove_module)
    /// is reused: only an existing `.module.json` or registry record counts
    /// as the module existing.
    pub fn create_module(
        &mut self,
        name: &str,
        description: &str,
        dependencies: Vec<String>,
    ) -> Result<Module> {
        validation::validate_module_path(name, &self.root, &self.config.modules_dir)?;
        validation::validate_module_name(name)?;

        let dir = self.module_dir(name);
        if paths::module_file(&dir).exists() || self.registry.has_module(name)? {
            return Err(VibecraftError::ModuleExists(name.to_string()));
        }

        let mut module = Module::new(name, description).with_dependencies(dependencies);
        module.path = self.config.module_rel_path(name);

        std::fs::create_dir_all(&dir)?;
        crate::io::write_json(&paths::module_file(&dir), &module)?;
        self.registry.add_module(module.clone())?;

        tracing::info!(module = name, deps = module.dependencies.len(), "created module");
        Ok(module)
    }

    /// Create every planned module that is not registered yet. Existing
    /// modules and names that fail validation are skipped, not fatal.
    pub fn import_planned(&mut self, planned: &[PlannedModule]) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        for p in planned {
            match self.create_module(&p.name, &p.description, Vec::new()) {
                Ok(module) => report.created.push(module),
                Err(e) if e.is_module_error() => {
                    tracing::warn!(module = %p.name, error = %e, "skipped planned module");
                    report.skipped.push(SkippedModule {
                        name: p.name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    /// Modules found on disk, sorted by name. Directories without a
    /// `.module.json` are skipped.
    pub fn list_modules(&self) -> Result<Vec<Module>> {
        let modules_dir = self.config.modules_path(&self.root);
        if !modules_dir.exists() {
            return Ok(Vec::new());
        }

        let mut modules = Vec::new();
        for entry in std::fs::read_dir(&modules_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let file = paths::module_file(&entry.path());
            if !file.exists() {
                continue;
            }
            modules.push(read_module_file(&file)?);
        }
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(modules)
    }

    pub fn get_status(&self, name: &str) -> Result<Module> {
        let file = paths::module_file(&self.module_dir(name));
        if !file.exists() {
            return Err(VibecraftError::ModuleNotFound(name.to_string()));
        }
        read_module_file(&file)
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Lay out the module's working files. Existing files are left alone.
    /// Returns the paths that were created.
    pub fn init_module(&self, name: &str) -> Result<Vec<PathBuf>> {
        let dir = self.module_dir(name);
        if !dir.exists() {
            return Err(VibecraftError::ModuleNotFound(name.to_string()));
        }

        let mut created = Vec::new();
        for sub in ["agents", "skills"] {
            let path = dir.join(sub);
            if !path.exists() {
                crate::io::ensure_dir(&path)?;
                created.push(path);
            }
        }
        for (file, title) in [("research.md", "Research"), ("stack.md", "Technology Stack")] {
            let path = dir.join(file);
            let body = format!("# {name} - {title}\n\n");
            if crate::io::write_if_missing(&path, body.as_bytes())? {
                created.push(path);
            }
        }

        tracing::debug!(module = name, created = created.len(), "initialized module");
        Ok(created)
    }

    /// Record implementation sub-phase `n` for a module. The first recorded
    /// phase moves a planned module to in progress.
    pub fn complete_phase(&mut self, name: &str, n: u32) -> Result<Module> {
        let current = self
            .registry
            .get_module(name)?
            .ok_or_else(|| VibecraftError::ModuleNotFound(name.to_string()))?;

        let mut phases = current.phases_completed.clone();
        if !phases.contains(&n) {
            phases.push(n);
        }
        let status = match current.status {
            ModuleStatus::Planned => ModuleStatus::InProgress,
            other => other,
        };

        let update = ModuleUpdate {
            status: Some(status),
            ..ModuleUpdate::default()
        }
        .with_phases_completed(phases);
        let updated = self.registry.update_module(name, update)?;

        let file = paths::module_file(&self.module_dir(name));
        if file.exists() {
            crate::io::write_json(&file, &updated)?;
        }
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Remove
    // -----------------------------------------------------------------------

    /// Drop the registry record and `.module.json`. The rest of the module
    /// directory stays on disk, and the name can be created again.
    pub fn remove_module(&mut self, name: &str) -> Result<()> {
        self.registry.remove_module(name)?;
        let file = paths::module_file(&self.module_dir(name));
        if file.exists() {
            std::fs::remove_file(&file)?;
        }
        tracing::info!(module = name, "removed module");
        Ok(())
    }
}

fn read_module_file(path: &Path) -> Result<Module> {
    let data = std::fs::read_to_string(path)?;
    let mut module: Module = serde_json::from_str(&data)?;
    module.normalize();
    Ok(module)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, ModuleManager) {
        let dir = TempDir::new().unwrap();
        let mgr = ModuleManager::new(dir.path()).unwrap();
        (dir, mgr)
    }

    #[test]
    fn new_creates_modules_dir() {
        let (dir, _mgr) = manager();
        assert!(dir.path().join("modules").is_dir());
    }

    #[test]
    fn create_writes_dir_file_and_registry() {
        let (dir, mut mgr) = manager();
        let m = mgr
            .create_module("auth", "Authentication", vec!["database".to_string()])
            .unwrap();
        assert_eq!(m.path, "modules/auth");
        assert_eq!(m.status, ModuleStatus::Planned);

        let file = dir.path().join("modules/auth/.module.json");
        assert!(file.exists());
        let on_disk: Module = serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(on_disk.dependencies, vec!["database"]);

        assert!(mgr.registry().has_module("auth").unwrap());
    }

    #[test]
    fn create_allows_forward_references() {
        let (_dir, mut mgr) = manager();
        mgr.create_module("api", "", vec!["not_yet".to_string()]).unwrap();
    }

    #[test]
    fn create_rejects_bad_names() {
        let (_dir, mut mgr) = manager();
        assert!(matches!(
            mgr.create_module("bad-name", "", Vec::new()),
            Err(VibecraftError::InvalidModuleName(_))
        ));
        assert!(matches!(
            mgr.create_module("2fast", "", Vec::new()),
            Err(VibecraftError::InvalidModuleName(_))
        ));
    }

    #[test]
    fn create_rejects_unsafe_paths_as_security_errors() {
        let (dir, mut mgr) = manager();
        for name in ["core", "../escape", "/abs"] {
            let err = mgr.create_module(name, "", Vec::new()).unwrap_err();
            assert!(err.is_security_error(), "{name:?}: {err}");
        }
        assert!(!dir.path().join("escape").exists());
    }

    #[test]
    fn create_twice_is_module_exists() {
        let (_dir, mut mgr) = manager();
        mgr.create_module("auth", "", Vec::new()).unwrap();
        let err = mgr.create_module("auth", "", Vec::new()).unwrap_err();
        assert!(matches!(err, VibecraftError::ModuleExists(_)));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn create_respects_configured_modules_dir() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            modules_dir: "components".to_string(),
            ..Config::default()
        };
        let mut mgr = ModuleManager::with_config(dir.path(), cfg).unwrap();
        let m = mgr.create_module("ui", "", Vec::new()).unwrap();
        assert_eq!(m.path, "components/ui");
        assert!(dir.path().join("components/ui/.module.json").exists());
    }

    #[test]
    fn list_is_sorted_and_skips_stray_dirs() {
        let (dir, mut mgr) = manager();
        mgr.create_module("zeta", "", Vec::new()).unwrap();
        mgr.create_module("alpha", "", Vec::new()).unwrap();
        std::fs::create_dir_all(dir.path().join("modules/scratch")).unwrap();
        std::fs::write(dir.path().join("modules/README.md"), "notes").unwrap();

        let names: Vec<String> = mgr.list_modules().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn status_of_missing_module() {
        let (_dir, mgr) = manager();
        assert!(matches!(
            mgr.get_status("ghost"),
            Err(VibecraftError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn init_creates_layout_once() {
        let (dir, mut mgr) = manager();
        mgr.create_module("auth", "", Vec::new()).unwrap();

        let created = mgr.init_module("auth").unwrap();
        assert_eq!(created.len(), 4);
        let research = dir.path().join("modules/auth/research.md");
        assert!(std::fs::read_to_string(&research).unwrap().starts_with("# auth - Research"));

        std::fs::write(&research, "my notes").unwrap();
        assert!(mgr.init_module("auth").unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(&research).unwrap(), "my notes");
    }

    #[test]
    fn init_missing_module() {
        let (_dir, mgr) = manager();
        assert!(matches!(
            mgr.init_module("ghost"),
            Err(VibecraftError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn complete_phase_moves_to_in_progress() {
        let (_dir, mut mgr) = manager();
        mgr.create_module("auth", "", Vec::new()).unwrap();

        let m = mgr.complete_phase("auth", 1).unwrap();
        assert_eq!(m.status, ModuleStatus::InProgress);
        assert_eq!(m.phases_completed, vec![1]);

        let m = mgr.complete_phase("auth", 1).unwrap();
        assert_eq!(m.phases_completed, vec![1]);

        let m = mgr.complete_phase("auth", 2).unwrap();
        assert_eq!(m.phases_completed, vec![1, 2]);
        assert_eq!(mgr.get_status("auth").unwrap().phases_completed, vec![1, 2]);
    }

    #[test]
    fn complete_phase_keeps_blocked_status() {
        let (_dir, mut mgr) = manager();
        mgr.create_module("auth", "", Vec::new()).unwrap();
        mgr.registry
            .update_module("auth", ModuleUpdate::status(ModuleStatus::Blocked))
            .unwrap();
        let m = mgr.complete_phase("auth", 1).unwrap();
        assert_eq!(m.status, ModuleStatus::Blocked);
    }

    #[test]
    fn remove_forgets_module_but_keeps_work() {
        let (dir, mut mgr) = manager();
        mgr.create_module("auth", "", Vec::new()).unwrap();
        mgr.init_module("auth").unwrap();
        mgr.remove_module("auth").unwrap();

        assert!(!mgr.registry().has_module("auth").unwrap());
        assert!(mgr.list_modules().unwrap().is_empty());
        assert!(matches!(
            mgr.get_status("auth"),
            Err(VibecraftError::ModuleNotFound(_))
        ));
        assert!(dir.path().join("modules/auth/research.md").exists());
        assert!(matches!(
            mgr.remove_module("auth"),
            Err(VibecraftError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn removed_name_can_be_created_again() {
        let (dir, mut mgr) = manager();
        mgr.create_module("auth", "First", Vec::new()).unwrap();
        mgr.remove_module("auth").unwrap();

        let m = mgr.create_module("auth", "Second", vec!["database".into()]).unwrap();
        assert_eq!(m.description, "Second");
        assert_eq!(mgr.get_status("auth").unwrap().description, "Second");
        assert_eq!(
            mgr.registry().get_module("auth").unwrap().unwrap().dependencies,
            vec!["database"]
        );
        let names: Vec<String> = mgr.list_modules().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["auth"]);
        assert!(dir.path().join("modules/auth/.module.json").exists());
    }

    #[test]
    fn import_planned_skips_existing_and_invalid() {
        let (_dir, mut mgr) = manager();
        mgr.create_module("auth", "Existing", Vec::new()).unwrap();

        let planned: Vec<PlannedModule> = [("auth", "Auth"), ("users", "User management"), ("core", "Reserved")]
            .into_iter()
            .map(|(n, d)| PlannedModule {
                name: n.to_string(),
                description: d.to_string(),
            })
            .collect();
        let report = mgr.import_planned(&planned).unwrap();

        let created: Vec<&str> = report.created.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(created, vec!["users"]);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skipped, vec!["auth", "core"]);
        assert!(report.skipped[0].reason.contains("already exists"));
        assert_eq!(mgr.get_status("users").unwrap().description, "User management");
        assert_eq!(mgr.get_status("auth").unwrap().description, "Existing");
    }
}
