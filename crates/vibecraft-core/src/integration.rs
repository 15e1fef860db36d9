use crate::config::Config;
use crate::dependency::DependencyAnalyzer;
use crate::error::{Result, VibecraftError};
use crate::module::Module;
use crate::paths;
use crate::registry::ModuleRegistry;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const GENERATED_BANNER: &str = "Generated by vibecraft. Do not edit: run `vibecraft integrate build`.";

/// Files written by [`IntegrationManager::build_project`].
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub build_order: Vec<String>,
    pub interfaces: PathBuf,
    pub connectors: Vec<PathBuf>,
}

/// Turns the module registry into the integration layer: a validated build
/// order, `interfaces.py` and one connector per dependent module.
///
/// Read-only until a generate or build call. A project without a registry
/// file, or with one that does not parse, is treated as having no modules.
#[derive(Debug, Clone)]
pub struct IntegrationManager {
    root: PathBuf,
    config: Config,
    registry_path: PathBuf,
}

impl IntegrationManager {
    pub fn new(root: &Path) -> Result<Self> {
        let config = Config::load(root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: &Path, config: Config) -> Self {
        Self {
            root: root.to_path_buf(),
            registry_path: paths::registry_path(root),
            config,
        }
    }

    pub fn integration_dir(&self) -> PathBuf {
        self.config.integration_path(&self.root)
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Analyzer over the current registry contents. Each call re-reads the
    /// registry file.
    pub fn analyzer(&self) -> Result<DependencyAnalyzer> {
        if !self.registry_path.exists() {
            return Ok(DependencyAnalyzer::from_modules(Vec::new()));
        }
        let registry = ModuleRegistry::open(&self.registry_path)?;
        match DependencyAnalyzer::new(&registry) {
            Err(VibecraftError::Json(e)) => {
                tracing::warn!(
                    path = %self.registry_path.display(),
                    error = %e,
                    "module registry is not valid JSON; treating it as empty"
                );
                Ok(DependencyAnalyzer::from_modules(Vec::new()))
            }
            other => other,
        }
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Every problem in the dependency graph, one line each. Empty when the
    /// graph is valid.
    pub fn analyze_dependencies(&self) -> Result<Vec<String>> {
        Ok(describe_problems(&self.analyzer()?))
    }

    pub fn get_build_order(&self) -> Result<Vec<String>> {
        self.analyzer()?.get_build_order()
    }

    pub fn validate(&self) -> Result<()> {
        self.analyzer()?.validate_dependencies()
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Validate, then write interfaces and connectors. Nothing is written
    /// when validation fails.
    pub fn build_project(&self) -> Result<BuildReport> {
        let analyzer = self.analyzer()?;
        analyzer.validate_dependencies()?;
        let build_order = analyzer.get_build_order()?;

        crate::io::ensure_dir(&self.integration_dir())?;
        let interfaces = self.write_interfaces(&analyzer, &build_order)?;
        let connectors = self.write_connectors(&analyzer, &build_order)?;

        tracing::info!(
            modules = build_order.len(),
            connectors = connectors.len(),
            "built integration layer"
        );
        Ok(BuildReport {
            build_order,
            interfaces,
            connectors,
        })
    }

    pub fn generate_interfaces(&self) -> Result<PathBuf> {
        let analyzer = self.analyzer()?;
        let order = analyzer.get_build_order()?;
        self.write_interfaces(&analyzer, &order)
    }

    pub fn generate_connectors(&self) -> Result<Vec<PathBuf>> {
        let analyzer = self.analyzer()?;
        let order = analyzer.get_build_order()?;
        self.write_connectors(&analyzer, &order)
    }

    fn write_interfaces(&self, analyzer: &DependencyAnalyzer, order: &[String]) -> Result<PathBuf> {
        let path = self.integration_dir().join(paths::INTERFACES_FILE);
        let content = render_interfaces(&ordered(analyzer.modules(), order));
        crate::io::atomic_write(&path, content.as_bytes())?;
        tracing::debug!(path = %path.display(), "wrote interfaces");
        Ok(path)
    }

    fn write_connectors(&self, analyzer: &DependencyAnalyzer, order: &[String]) -> Result<Vec<PathBuf>> {
        let dir = self.config.connectors_path(&self.root);
        crate::io::ensure_dir(&dir)?;

        let modules = ordered(analyzer.modules(), order);
        let paths_by_name: HashMap<&str, &str> = modules
            .iter()
            .map(|m| (m.name.as_str(), m.path.as_str()))
            .collect();

        let mut written = Vec::new();
        let mut connector_names = Vec::new();
        for m in modules.iter().filter(|m| !m.dependencies.is_empty()) {
            let deps: Vec<(String, String)> = m
                .dependencies
                .iter()
                .map(|d| {
                    let rel = paths_by_name
                        .get(d.as_str())
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| self.config.module_rel_path(d));
                    (d.clone(), python_import_path(&rel))
                })
                .collect();

            let path = paths::connector_file(&dir, &m.name);
            let content = render_connector(m, &python_import_path(&m.path), &deps);
            crate::io::atomic_write(&path, content.as_bytes())?;
            connector_names.push(format!("{}_connector", m.name));
            written.push(path);
        }

        let init = dir.join("__init__.py");
        crate::io::atomic_write(&init, render_connectors_init(&connector_names).as_bytes())?;
        Ok(written)
    }
}

/// One human-readable line per missing dependency, then one for a cycle.
pub fn describe_problems(analyzer: &DependencyAnalyzer) -> Vec<String> {
    let mut problems: Vec<String> = analyzer
        .missing_dependencies()
        .into_iter()
        .map(|(module, dependency)| {
            format!("Module '{module}' depends on non-existent module '{dependency}'")
        })
        .collect();
    if let Some(cycle) = analyzer.find_cycle() {
        problems.push(format!(
            "Circular dependencies detected: {}",
            cycle.join(" -> ")
        ));
    }
    problems
}

/// Declared modules in build order. Undeclared names in `order` are skipped.
fn ordered<'a>(modules: &'a [Module], order: &[String]) -> Vec<&'a Module> {
    let by_name: HashMap<&str, &Module> = modules.iter().map(|m| (m.name.as_str(), m)).collect();
    order
        .iter()
        .filter_map(|name| by_name.get(name.as_str()).copied())
        .collect()
}

/// `modules/auth` -> `modules.auth`.
fn python_import_path(rel: &str) -> String {
    rel.trim_matches('/')
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join(".")
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_interfaces(modules: &[&Module]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\"\"\"Module interfaces.\n\n{GENERATED_BANNER}\n\"\"\"");
    out.push_str("\nfrom typing import Protocol\n");

    for m in modules.iter().filter(|m| !m.exports.is_empty()) {
        let _ = writeln!(out, "\n\n# --- {} ---", m.name);
        for export in &m.exports {
            let _ = write!(
                out,
                "\n\nclass {export}(Protocol):\n    \"\"\"Exported by module '{}'.\"\"\"\n\n    ...\n",
                m.name
            );
        }
    }
    out
}

fn render_connector(module: &Module, import_path: &str, deps: &[(String, String)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\"\"\"Connector for module '{}'.\n\n{GENERATED_BANNER}\n\"\"\"",
        module.name
    );

    out.push_str("\n# Dependencies\n");
    for (name, path) in deps {
        let _ = writeln!(out, "import {path} as {name}  # noqa: F401");
    }

    if module.exports.is_empty() {
        out.push_str("\n__all__: list[str] = []\n");
        return out;
    }

    out.push_str("\n# Exports\n");
    let _ = writeln!(out, "from {import_path} import (  # noqa: F401");
    for export in &module.exports {
        let _ = writeln!(out, "    {export},");
    }
    out.push_str(")\n\n__all__ = [\n");
    for export in &module.exports {
        let _ = writeln!(out, "    \"{export}\",");
    }
    out.push_str("]\n");
    out
}

fn render_connectors_init(connectors: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\"\"\"Module connectors.\n\n{GENERATED_BANNER}\n\"\"\"");
    out.push_str("\n__all__ = [\n");
    for name in connectors {
        let _ = writeln!(out, "    \"{name}\",");
    }
    out.push_str("]\n");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(registry: &str) -> (TempDir, IntegrationManager) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(paths::VIBECRAFT_DIR)).unwrap();
        std::fs::write(paths::registry_path(dir.path()), registry).unwrap();
        let mgr = IntegrationManager::new(dir.path()).unwrap();
        (dir, mgr)
    }

    const LAYERED: &str = r#"{"modules": [
        {"name": "database", "dependencies": [], "exports": ["Repository"]},
        {"name": "auth", "dependencies": ["database"], "exports": ["AuthService", "User"]},
        {"name": "api", "dependencies": ["auth", "database"], "exports": ["APIHandler"]}
    ], "dependencies": {}, "build_order": []}"#;

    #[test]
    fn construction_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let mgr = IntegrationManager::new(dir.path()).unwrap();
        assert_eq!(mgr.integration_dir(), dir.path().join("integration"));
        assert!(!dir.path().join("integration").exists());
        assert!(!dir.path().join(".vibecraft").exists());
    }

    #[test]
    fn missing_registry_means_no_modules() {
        let dir = TempDir::new().unwrap();
        let mgr = IntegrationManager::new(dir.path()).unwrap();
        assert!(mgr.analyze_dependencies().unwrap().is_empty());
        assert!(mgr.get_build_order().unwrap().is_empty());
        assert!(!paths::registry_path(dir.path()).exists());
    }

    #[test]
    fn analyze_valid_graph() {
        let (_dir, mgr) = project(LAYERED);
        assert!(mgr.analyze_dependencies().unwrap().is_empty());
        assert_eq!(mgr.get_build_order().unwrap(), vec!["database", "auth", "api"]);
    }

    #[test]
    fn analyze_reports_missing_and_cycle() {
        let (_dir, mgr) = project(
            r#"{"modules": [
                {"name": "a", "dependencies": ["b"]},
                {"name": "b", "dependencies": ["a", "nonexistent"]}
            ]}"#,
        );
        let problems = mgr.analyze_dependencies().unwrap();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("nonexistent"));
        assert!(problems[1].contains("Circular"));
    }

    #[test]
    fn malformed_registry_reads_as_empty() {
        let (dir, mgr) = project("not valid json");
        assert!(mgr.analyze_dependencies().unwrap().is_empty());
        assert!(mgr.get_build_order().unwrap().is_empty());
        assert!(mgr.validate().is_ok());
        assert_eq!(
            std::fs::read_to_string(paths::registry_path(dir.path())).unwrap(),
            "not valid json"
        );

        let registry = ModuleRegistry::open(paths::registry_path(dir.path())).unwrap();
        assert!(matches!(
            registry.get_all_modules(),
            Err(VibecraftError::Json(_))
        ));
    }

    #[test]
    fn problems_come_from_one_analyzer() {
        let (_dir, mgr) = project(r#"{"modules": [{"name": "api", "dependencies": ["auth"]}]}"#);
        let analyzer = mgr.analyzer().unwrap();
        let problems = describe_problems(&analyzer);
        assert_eq!(
            problems,
            vec!["Module 'api' depends on non-existent module 'auth'"]
        );
        assert!(analyzer.validate_dependencies().unwrap_err().is_dependency_error());
    }

    #[test]
    fn generate_interfaces_without_modules() {
        let (dir, mgr) = project(r#"{"modules": []}"#);
        let path = mgr.generate_interfaces().unwrap();
        assert_eq!(path, dir.path().join("integration/interfaces.py"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("from typing import Protocol"));
        assert!(!content.contains("class "));
    }

    #[test]
    fn generate_interfaces_in_build_order() {
        let (dir, mgr) = project(LAYERED);
        let path = mgr.generate_interfaces().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let pos = |needle: &str| content.find(needle).unwrap();
        assert!(pos("class Repository(Protocol):") < pos("class AuthService(Protocol):"));
        assert!(pos("class AuthService(Protocol):") < pos("class APIHandler(Protocol):"));
        assert!(!dir.path().join("integration/connectors").exists());
    }

    #[test]
    fn build_writes_interfaces_and_connectors() {
        let (dir, mgr) = project(LAYERED);
        let report = mgr.build_project().unwrap();
        assert_eq!(report.build_order, vec!["database", "auth", "api"]);

        let interfaces = std::fs::read_to_string(dir.path().join("integration/interfaces.py")).unwrap();
        assert!(interfaces.contains("from typing import Protocol"));
        assert!(interfaces.contains("class AuthService(Protocol):"));
        assert!(interfaces.contains("class User(Protocol):"));
        assert!(
            interfaces.find("# --- database ---").unwrap() < interfaces.find("# --- api ---").unwrap()
        );

        let connectors = dir.path().join("integration/connectors");
        assert!(connectors.join("__init__.py").exists());
        assert!(!connectors.join("database_connector.py").exists());
        assert_eq!(report.connectors.len(), 2);

        let api = std::fs::read_to_string(connectors.join("api_connector.py")).unwrap();
        assert!(api.contains("import modules.auth as auth"));
        assert!(api.contains("import modules.database as database"));
        assert!(api.contains("from modules.api import ("));
        assert!(api.contains("\"APIHandler\","));
    }

    #[test]
    fn build_refuses_invalid_graph() {
        let (dir, mgr) = project(r#"{"modules": [{"name": "api", "dependencies": ["nonexistent"]}]}"#);
        assert!(matches!(
            mgr.build_project(),
            Err(VibecraftError::MissingDependency { .. })
        ));
        assert!(!dir.path().join("integration").exists());

        let (dir, mgr) = project(
            r#"{"modules": [{"name": "a", "dependencies": ["b"]}, {"name": "b", "dependencies": ["a"]}]}"#,
        );
        assert!(matches!(
            mgr.build_project(),
            Err(VibecraftError::CyclicDependency(_))
        ));
        assert!(!dir.path().join("integration").exists());
    }

    #[test]
    fn build_with_no_modules_still_writes_skeleton() {
        let (dir, mgr) = project(r#"{"modules": []}"#);
        mgr.build_project().unwrap();
        let interfaces = std::fs::read_to_string(dir.path().join("integration/interfaces.py")).unwrap();
        assert!(interfaces.contains("Protocol"));
        assert!(dir.path().join("integration/connectors/__init__.py").exists());
    }

    #[test]
    fn connectors_tolerate_undeclared_dependencies() {
        let (dir, mgr) = project(
            r#"{"modules": [{"name": "api", "dependencies": ["auth"], "exports": ["handle_request"]}]}"#,
        );
        let written = mgr.generate_connectors().unwrap();
        assert_eq!(written.len(), 1);
        let content =
            std::fs::read_to_string(dir.path().join("integration/connectors/api_connector.py")).unwrap();
        assert!(content.contains("import modules.auth as auth"));
        assert!(content.contains("handle_request"));
    }

    #[test]
    fn connector_without_exports_has_empty_all() {
        let m = Module::new("api", "").with_dependencies(["auth"]);
        let content = render_connector(&m, "modules.api", &[("auth".into(), "modules.auth".into())]);
        assert!(content.contains("__all__: list[str] = []"));
        assert!(!content.contains("# Exports"));
    }

    #[test]
    fn import_paths() {
        assert_eq!(python_import_path("modules/auth"), "modules.auth");
        assert_eq!(python_import_path("./parts/ui/"), "parts.ui");
    }
}
