use crate::config::Config;
use crate::error::Result;
use crate::inputs::ProjectInputs;
use crate::manifest::Manifest;
use crate::paths;
use crate::registry::ModuleRegistry;
use crate::types::ProjectMode;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ScaffoldOptions {
    /// Defaults to the name found in the research document, then to the
    /// root directory's name.
    pub project_name: Option<String>,
    pub mode: ProjectMode,
    /// Defaults to the types detected in the inputs.
    pub project_type: Vec<String>,
    /// Research and stack documents, copied into `docs/`.
    pub inputs: Option<ProjectInputs>,
    /// Rewrite the manifest even if one exists. Phase progress is lost.
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldEntry {
    /// Relative to the project root.
    pub path: String,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldReport {
    pub project_name: String,
    pub mode: ProjectMode,
    pub project_type: Vec<String>,
    pub entries: Vec<ScaffoldEntry>,
}

impl ScaffoldReport {
    fn record(&mut self, root: &Path, path: &Path, created: bool) {
        let rel = path.strip_prefix(root).unwrap_or(path);
        self.entries.push(ScaffoldEntry {
            path: rel.display().to_string(),
            created,
        });
    }

    pub fn created_count(&self) -> usize {
        self.entries.iter().filter(|e| e.created).count()
    }
}

fn project_name_from(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// Lay out a project under `root`. Safe to run again: existing directories,
/// registry and manifest are kept unless `force` asks for a new manifest.
/// Inputs are validated before anything is written.
pub fn init_project(root: &Path, opts: &ScaffoldOptions) -> Result<ScaffoldReport> {
    let config = Config::load(root)?;
    if let Some(inputs) = &opts.inputs {
        inputs.validate(opts.project_name.is_some())?;
    }

    let project_name = opts
        .project_name
        .clone()
        .or_else(|| opts.inputs.as_ref().and_then(ProjectInputs::project_name))
        .unwrap_or_else(|| project_name_from(root));
    let project_type = match &opts.inputs {
        Some(inputs) if opts.project_type.is_empty() => inputs.project_types(),
        _ => opts.project_type.clone(),
    };

    let mut report = ScaffoldReport {
        project_name: project_name.clone(),
        mode: opts.mode,
        project_type: project_type.clone(),
        entries: Vec::new(),
    };

    let mut dirs: Vec<PathBuf> = [
        paths::VIBECRAFT_DIR,
        paths::AGENTS_DIR,
        paths::SKILLS_DIR,
        paths::PROMPTS_DIR,
        paths::SNAPSHOTS_DIR,
        paths::DOCS_DIR,
        paths::DOCS_DESIGN_DIR,
        paths::DOCS_PLANS_DIR,
    ]
    .iter()
    .map(|d| root.join(d))
    .collect();

    if opts.mode == ProjectMode::Modular {
        dirs.push(config.modules_path(root));
        dirs.push(config.shared_path(root));
        dirs.push(config.integration_path(root));
        dirs.push(root.join(paths::SRC_TESTS_DIR));
    }

    for dir in &dirs {
        let existed = dir.is_dir();
        crate::io::ensure_dir(dir)?;
        report.record(root, dir, !existed);
    }

    if let Some(inputs) = &opts.inputs {
        let existed = [paths::RESEARCH_DOC, paths::STACK_DOC].map(|d| root.join(d).exists());
        let copied = inputs.copy_into(root)?;
        for (path, existed) in copied.iter().zip(existed) {
            report.record(root, path, !existed);
        }
    }

    if opts.mode == ProjectMode::Modular {
        let registry = paths::registry_path(root);
        let existed = registry.exists();
        ModuleRegistry::open(&registry)?;
        report.record(root, &registry, !existed);
    }

    let manifest = paths::manifest_path(root);
    let existed = manifest.exists();
    if !existed || opts.force {
        let mut m = Manifest::new(&project_name, opts.mode, project_type);
        if let Some(inputs) = &opts.inputs {
            m.stack = inputs.stack_entries();
        }
        m.save(root)?;
    }
    report.record(root, &manifest, !existed || opts.force);

    tracing::info!(
        root = %root.display(),
        mode = %opts.mode,
        created = report.created_count(),
        "initialized project"
    );
    Ok(report)
}
