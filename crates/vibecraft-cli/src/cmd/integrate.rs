use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use vibecraft_core::integration::{describe_problems, IntegrationManager};

#[derive(Subcommand)]
pub enum IntegrateSubcommand {
    /// Report missing and circular module dependencies
    Analyze,
    /// Print the module build order
    Order,
    /// Validate dependencies, then generate interfaces and connectors
    Build,
}

pub fn run(root: &Path, subcmd: IntegrateSubcommand, json: bool) -> anyhow::Result<()> {
    super::ensure_initialized(root)?;
    let mgr = IntegrationManager::new(root).context("failed to load project config")?;

    match subcmd {
        IntegrateSubcommand::Analyze => analyze(&mgr, json),
        IntegrateSubcommand::Order => order(&mgr, json),
        IntegrateSubcommand::Build => build(root, &mgr, json),
    }
}

fn analyze(mgr: &IntegrationManager, json: bool) -> anyhow::Result<()> {
    let analyzer = mgr.analyzer().context("failed to read module registry")?;
    let problems = describe_problems(&analyzer);

    if json {
        print_json(&serde_json::json!({
            "valid": problems.is_empty(),
            "problems": problems,
        }))?;
    } else if problems.is_empty() {
        println!("Dependencies OK.");
    } else {
        println!("Found {} dependency problem(s):", problems.len());
        for p in &problems {
            println!("  - {p}");
        }
    }

    analyzer
        .validate_dependencies()
        .context("dependency analysis failed")?;
    Ok(())
}

fn order(mgr: &IntegrationManager, json: bool) -> anyhow::Result<()> {
    let order = mgr.get_build_order()?;

    if json {
        return print_json(&order);
    }
    if order.is_empty() {
        println!("No modules.");
        return Ok(());
    }
    for (i, name) in order.iter().enumerate() {
        println!("{:>3}. {name}", i + 1);
    }
    Ok(())
}

fn build(root: &Path, mgr: &IntegrationManager, json: bool) -> anyhow::Result<()> {
    let report = mgr.build_project().context("integration build failed")?;

    if json {
        return print_json(&report);
    }
    let rel = |p: &Path| p.strip_prefix(root).unwrap_or(p).display().to_string();
    if !report.build_order.is_empty() {
        println!("Build order: {}", report.build_order.join(" -> "));
    }
    println!("  wrote: {}", rel(&report.interfaces));
    for c in &report.connectors {
        println!("  wrote: {}", rel(c));
    }
    Ok(())
}
