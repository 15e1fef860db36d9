use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use vibecraft_core::{
    inputs::ProjectInputs,
    scaffold::{self, ScaffoldOptions},
    types::ProjectMode,
};

#[derive(Args)]
pub struct InitArgs {
    /// Project name (default: first heading of --research, else the root directory's name)
    #[arg(long)]
    name: Option<String>,

    /// simple or modular
    #[arg(long, default_value = "simple")]
    mode: String,

    /// Project type, repeatable (default: detected from --research and --stack)
    #[arg(long = "type")]
    project_type: Vec<String>,

    /// Research document, copied to docs/research.md
    #[arg(long, short = 'r', requires = "stack")]
    research: Option<PathBuf>,

    /// Stack description, copied to docs/stack.md
    #[arg(long, short = 's', requires = "research")]
    stack: Option<PathBuf>,

    /// Rewrite the manifest even if one exists (discards phase progress)
    #[arg(long)]
    force: bool,
}

pub fn run(root: &Path, args: InitArgs, json: bool) -> anyhow::Result<()> {
    let mode = ProjectMode::from_str(&args.mode)?;
    let inputs = match (&args.research, &args.stack) {
        (Some(research), Some(stack)) => Some(
            ProjectInputs::read(research, stack)
                .with_context(|| format!("failed to read {} or {}", research.display(), stack.display()))?,
        ),
        _ => None,
    };
    let opts = ScaffoldOptions {
        project_name: args.name,
        mode,
        project_type: args.project_type,
        inputs,
        force: args.force,
    };
    let report = scaffold::init_project(root, &opts)
        .with_context(|| format!("failed to initialize {}", root.display()))?;

    if json {
        return print_json(&report);
    }

    println!(
        "Initializing vibecraft ({mode}) in: {}\nProject: {} [{}]",
        root.display(),
        report.project_name,
        report.project_type.join(", ")
    );
    for entry in &report.entries {
        if entry.created {
            println!("  created: {}", entry.path);
        } else {
            println!("  exists:  {}", entry.path);
        }
    }

    println!("\nNext steps:");
    println!("  vibecraft status            see project state");
    if mode == ProjectMode::Modular {
        if opts.inputs.is_some() {
            println!("  vibecraft module extract    register modules listed in docs/research.md");
        }
        println!("  vibecraft module create <name>");
    }
    println!("  vibecraft complete-skill research_skill");
    Ok(())
}
