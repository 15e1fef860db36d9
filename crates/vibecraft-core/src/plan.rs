use crate::error::Result;
use crate::paths;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static MODULE_LINE_RE: OnceLock<Regex> = OnceLock::new();

/// `- name: description` or `* name: description`, optionally indented.
fn module_line_re() -> &'static Regex {
    MODULE_LINE_RE.get_or_init(|| Regex::new(r"^\s*[-*]\s*(\w+)\s*:\s*(.+)$").unwrap())
}

/// A module named in the research document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedModule {
    pub name: String,
    pub description: String,
}

/// Every module list entry in `research`, in document order. Names with
/// characters outside `\w` (e.g. `invalid-module`) do not match.
pub fn extract_modules(research: &str) -> Vec<PlannedModule> {
    research
        .lines()
        .filter_map(|line| module_line_re().captures(line))
        .map(|caps| PlannedModule {
            name: caps[1].to_string(),
            description: caps[2].trim().to_string(),
        })
        .collect()
}

pub fn render_plan(modules: &[PlannedModule]) -> String {
    let mut lines: Vec<String> = [
        "# Development Plan",
        "",
        "## Overview",
        "",
        "This plan outlines the development phases for the project.",
        "",
        "## Modules",
        "",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if modules.is_empty() {
        lines.push("No modules defined yet.".to_string());
    }
    for m in modules {
        lines.push(format!("- **{}**: {}", m.name, m.description));
    }

    lines.extend(
        [
            "",
            "## Phases",
            "",
            "### Phase 1: Foundation",
            "",
            "1. Set up project structure",
            "2. Create base modules",
            "",
            "### Phase 2: Core Features",
            "",
            "1. Implement core functionality",
            "2. Add integrations",
            "",
            "### Phase 3: Polish",
            "",
            "1. Testing and refinement",
            "2. Documentation",
            "",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    lines.join("\n")
}

/// Reads `docs/research.md` and writes `docs/plans/development-plan.md`.
#[derive(Debug, Clone)]
pub struct PlanGenerator {
    root: PathBuf,
}

impl PlanGenerator {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn plan_path(&self) -> PathBuf {
        self.root.join(paths::PLAN_FILE)
    }

    /// Modules listed in `docs/research.md`. Empty when the file is missing.
    pub fn extract_modules(&self) -> Result<Vec<PlannedModule>> {
        let research = self.root.join(paths::RESEARCH_DOC);
        if !research.exists() {
            return Ok(Vec::new());
        }
        Ok(extract_modules(&std::fs::read_to_string(research)?))
    }

    /// Render the plan from the research document and write it, replacing
    /// any earlier plan. Returns the markdown.
    pub fn generate_plan(&self) -> Result<String> {
        let modules = self.extract_modules()?;
        self.write_plan(&modules)
    }

    pub fn write_plan(&self, modules: &[PlannedModule]) -> Result<String> {
        let plan = render_plan(modules);
        crate::io::atomic_write(&self.plan_path(), plan.as_bytes())?;
        tracing::info!(modules = modules.len(), "wrote development plan");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(research: Option<&str>) -> (TempDir, PlanGenerator) {
        let dir = TempDir::new().unwrap();
        if let Some(text) = research {
            let path = dir.path().join(paths::RESEARCH_DOC);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }
        let generator = PlanGenerator::new(dir.path());
        (dir, generator)
    }

    #[test]
    fn dash_asterisk_and_indented_entries() {
        let modules = extract_modules(
            "# Research\n\n- auth: Authentication module\n  * users:   User management  \nplain: not a list item\n",
        );
        assert_eq!(
            modules,
            vec![
                PlannedModule {
                    name: "auth".into(),
                    description: "Authentication module".into()
                },
                PlannedModule {
                    name: "users".into(),
                    description: "User management".into()
                },
            ]
        );
    }

    #[test]
    fn only_word_character_names_match() {
        let names: Vec<String> = extract_modules(
            "- auth: Valid module\n- invalid-module: Should not match\n- also_valid: Another module\n",
        )
        .into_iter()
        .map(|m| m.name)
        .collect();
        assert_eq!(names, vec!["auth", "also_valid"]);
    }

    #[test]
    fn missing_or_empty_research() {
        let (_dir, generator) = project(None);
        assert!(generator.extract_modules().unwrap().is_empty());
        let (_dir, generator) = project(Some(""));
        assert!(generator.extract_modules().unwrap().is_empty());
    }

    #[test]
    fn generate_plan_writes_file() {
        let (dir, generator) = project(Some("- auth: Authentication module\n"));
        let plan = generator.generate_plan().unwrap();
        assert!(plan.starts_with("# Development Plan"));
        assert!(plan.contains("- **auth**: Authentication module"));
        assert!(plan.contains("### Phase 3: Polish"));
        let on_disk = std::fs::read_to_string(dir.path().join("docs/plans/development-plan.md")).unwrap();
        assert_eq!(on_disk, plan);
    }

    #[test]
    fn plan_without_modules() {
        let (dir, generator) = project(None);
        let plan = generator.generate_plan().unwrap();
        assert!(plan.contains("No modules defined yet."));
        assert!(dir.path().join("docs/plans").is_dir());
    }
}
