use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const VIBECRAFT_DIR: &str = ".vibecraft";
pub const AGENTS_DIR: &str = ".vibecraft/agents";
pub const SKILLS_DIR: &str = ".vibecraft/skills";
pub const PROMPTS_DIR: &str = ".vibecraft/prompts";
pub const SNAPSHOTS_DIR: &str = ".vibecraft/snapshots";

pub const DOCS_DIR: &str = "docs";
pub const DOCS_DESIGN_DIR: &str = "docs/design";
pub const DOCS_PLANS_DIR: &str = "docs/plans";
pub const SRC_TESTS_DIR: &str = "src/tests";

pub const RESEARCH_DOC: &str = "docs/research.md";
pub const STACK_DOC: &str = "docs/stack.md";
pub const PLAN_FILE: &str = "docs/plans/development-plan.md";

pub const MANIFEST_FILE: &str = ".vibecraft/manifest.json";
pub const REGISTRY_FILE: &str = ".vibecraft/modules-registry.json";
pub const CONFIG_FILE: &str = ".vibecraft/config.yaml";

pub const MODULE_FILE: &str = ".module.json";
pub const INTERFACES_FILE: &str = "interfaces.py";
pub const CONNECTORS_DIR: &str = "connectors";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn registry_path(root: &Path) -> PathBuf {
    root.join(REGISTRY_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Default registry `path` for a module: `modules/<name>`.
pub fn default_module_path(name: &str) -> String {
    format!("modules/{name}")
}

pub fn module_file(module_dir: &Path) -> PathBuf {
    module_dir.join(MODULE_FILE)
}

/// Connector file generated for a module under `integration/connectors/`.
pub fn connector_file(connectors_dir: &Path, module: &str) -> PathBuf {
    connectors_dir.join(format!("{module}_connector.py"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            manifest_path(root),
            PathBuf::from("/tmp/proj/.vibecraft/manifest.json")
        );
        assert_eq!(
            registry_path(root),
            PathBuf::from("/tmp/proj/.vibecraft/modules-registry.json")
        );
        assert_eq!(default_module_path("auth"), "modules/auth");
        assert_eq!(
            connector_file(Path::new("/x/connectors"), "api"),
            PathBuf::from("/x/connectors/api_connector.py")
        );
    }
}
