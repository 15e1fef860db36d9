use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use vibecraft_core::manifest::Manifest;

pub fn implement_phase(root: &Path, n: u32, json: bool) -> anyhow::Result<()> {
    let mut manifest = super::load_manifest(root)?;
    manifest.complete_implement_phase(n);
    save(root, &manifest)?;

    if json {
        return report(&manifest);
    }
    println!("Phase {n} marked as complete.");
    println!("Current phase: {}", manifest.current_phase);
    Ok(())
}

pub fn skill(root: &Path, skill: &str, sub_phase: Option<u32>, json: bool) -> anyhow::Result<()> {
    let mut manifest = super::load_manifest(root)?;
    manifest.complete_skill(skill, sub_phase);
    save(root, &manifest)?;

    if json {
        return report(&manifest);
    }
    match sub_phase {
        Some(n) if n > 0 => println!("Skill '{skill}' phase {n} marked as complete."),
        _ => println!("Skill '{skill}' marked as complete."),
    }
    println!("Current phase: {}", manifest.current_phase);
    Ok(())
}

pub fn implement_phases(root: &Path, total: u32, json: bool) -> anyhow::Result<()> {
    let mut manifest = super::load_manifest(root)?;
    manifest.set_total_implement_phases(total);
    save(root, &manifest)?;

    if json {
        return report(&manifest);
    }
    println!("Implementation split into {total} sub-phases.");
    println!("Current phase: {}", manifest.current_phase);
    Ok(())
}

fn save(root: &Path, manifest: &Manifest) -> anyhow::Result<()> {
    manifest.save(root).context("failed to save manifest")
}

fn report(manifest: &Manifest) -> anyhow::Result<()> {
    print_json(&serde_json::json!({
        "current_phase": manifest.current_phase,
        "phases_completed": manifest.phases_completed,
        "total_implement_phases": manifest.total_implement_phases,
    }))
}
