use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use vibecraft_core::plan::PlanGenerator;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    super::ensure_initialized(root)?;
    let generator = PlanGenerator::new(root);
    let modules = generator
        .extract_modules()
        .context("failed to read docs/research.md")?;
    let plan = generator
        .write_plan(&modules)
        .context("failed to write development plan")?;

    let path = generator.plan_path();
    let rel = path.strip_prefix(root).unwrap_or(&path).display().to_string();
    if json {
        return print_json(&serde_json::json!({
            "path": rel,
            "modules": modules,
            "plan": plan,
        }));
    }
    println!("Wrote {rel} ({} module(s)).", modules.len());
    Ok(())
}
