use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use vibecraft_core::{
    dependency::DependencyAnalyzer, module_manager::ModuleManager, plan::PlanGenerator,
};

#[derive(Subcommand)]
pub enum ModuleSubcommand {
    /// Create a module under modules/<name>
    Create {
        name: String,
        #[arg(long, short = 'd', default_value = "")]
        description: String,
        /// Module this one depends on, repeatable. It may not exist yet.
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
    },
    /// Create the modules listed as `- name: description` in docs/research.md
    Extract,
    /// List modules
    List,
    /// Show one module
    Status { name: String },
    /// Create agents/, skills/, research.md and stack.md in a module
    Init { name: String },
    /// Mark a module's implementation sub-phase N as complete
    Complete { name: String, phase: u32 },
    /// Forget a module: drops its registry record and .module.json, keeps its files
    Remove { name: String },
}

pub fn run(root: &Path, subcmd: ModuleSubcommand, json: bool) -> anyhow::Result<()> {
    super::ensure_initialized(root)?;
    let mut mgr = ModuleManager::new(root).context("failed to open module registry")?;

    match subcmd {
        ModuleSubcommand::Create {
            name,
            description,
            depends_on,
        } => create(&mut mgr, &name, &description, depends_on, json),
        ModuleSubcommand::Extract => extract(root, &mut mgr, json),
        ModuleSubcommand::List => list(&mgr, json),
        ModuleSubcommand::Status { name } => status(&mgr, &name, json),
        ModuleSubcommand::Init { name } => init(root, &mgr, &name, json),
        ModuleSubcommand::Complete { name, phase } => complete(&mut mgr, &name, phase, json),
        ModuleSubcommand::Remove { name } => remove(&mut mgr, &name, json),
    }
}

fn create(
    mgr: &mut ModuleManager,
    name: &str,
    description: &str,
    depends_on: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let module = mgr
        .create_module(name, description, depends_on)
        .with_context(|| format!("failed to create module '{name}'"))?;

    if json {
        return print_json(&module);
    }
    println!("Created module: {} ({})", module.name, module.path);
    if !module.dependencies.is_empty() {
        println!("Depends on: {}", module.dependencies.join(", "));
    }
    println!("Next: vibecraft module init {name}");
    Ok(())
}

fn extract(root: &Path, mgr: &mut ModuleManager, json: bool) -> anyhow::Result<()> {
    let planned = PlanGenerator::new(root)
        .extract_modules()
        .context("failed to read docs/research.md")?;
    let report = mgr
        .import_planned(&planned)
        .context("failed to create planned modules")?;

    if json {
        return print_json(&report);
    }
    if planned.is_empty() {
        println!("No modules found in docs/research.md (expected lines like '- auth: Authentication').");
        return Ok(());
    }
    for m in &report.created {
        println!("  created: {} ({})", m.name, m.path);
    }
    for s in &report.skipped {
        println!("  skipped: {} ({})", s.name, s.reason);
    }
    println!(
        "{} created, {} skipped.",
        report.created.len(),
        report.skipped.len()
    );
    Ok(())
}

fn list(mgr: &ModuleManager, json: bool) -> anyhow::Result<()> {
    let modules = mgr.list_modules().context("failed to list modules")?;

    if json {
        return print_json(&modules);
    }
    if modules.is_empty() {
        println!("No modules yet. Run: vibecraft module create <name>");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = modules
        .iter()
        .map(|m| {
            vec![
                m.name.clone(),
                m.status.to_string(),
                m.dependencies.join(", "),
                m.description.clone(),
            ]
        })
        .collect();
    print_table(&["NAME", "STATUS", "DEPENDS ON", "DESCRIPTION"], rows);
    Ok(())
}

fn status(mgr: &ModuleManager, name: &str, json: bool) -> anyhow::Result<()> {
    let module = mgr.get_status(name)?;

    if json {
        return print_json(&module);
    }
    println!("Module:      {}", module.name);
    println!("Path:        {}", module.path);
    println!("Status:      {}", module.status);
    if !module.description.is_empty() {
        println!("Description: {}", module.description);
    }
    if !module.dependencies.is_empty() {
        println!("Depends on:  {}", module.dependencies.join(", "));
    }
    let dependents = DependencyAnalyzer::new(mgr.registry())
        .context("failed to read module registry")?
        .dependents_of(name);
    if !dependents.is_empty() {
        println!("Needed by:   {}", dependents.join(", "));
    }
    if !module.exports.is_empty() {
        println!("Exports:     {}", module.exports.join(", "));
    }
    if !module.phases_completed.is_empty() {
        let phases: Vec<String> = module.phases_completed.iter().map(u32::to_string).collect();
        println!("Phases done: {}", phases.join(", "));
    }
    println!("Created:     {}", module.created_at.format("%Y-%m-%d %H:%M UTC"));
    Ok(())
}

fn init(root: &Path, mgr: &ModuleManager, name: &str, json: bool) -> anyhow::Result<()> {
    let created = mgr
        .init_module(name)
        .with_context(|| format!("failed to initialize module '{name}'"))?;

    if json {
        let created: Vec<String> = created
            .iter()
            .map(|p| p.strip_prefix(root).unwrap_or(p).display().to_string())
            .collect();
        return print_json(&serde_json::json!({ "module": name, "created": created }));
    }
    if created.is_empty() {
        println!("Module '{name}' already initialized.");
    }
    for p in &created {
        println!("  created: {}", p.strip_prefix(root).unwrap_or(p).display());
    }
    Ok(())
}

fn complete(mgr: &mut ModuleManager, name: &str, phase: u32, json: bool) -> anyhow::Result<()> {
    let module = mgr
        .complete_phase(name, phase)
        .with_context(|| format!("failed to update module '{name}'"))?;

    if json {
        return print_json(&module);
    }
    println!("Module '{name}': phase {phase} marked as complete ({}).", module.status);
    Ok(())
}

fn remove(mgr: &mut ModuleManager, name: &str, json: bool) -> anyhow::Result<()> {
    mgr.remove_module(name)?;

    if json {
        return print_json(&serde_json::json!({ "removed": name }));
    }
    println!("Removed module '{name}'. Its other files were kept on disk.");
    Ok(())
}
