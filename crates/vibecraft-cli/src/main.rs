mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{integrate::IntegrateSubcommand, module::ModuleSubcommand};
use std::path::PathBuf;
use vibecraft_core::VibecraftError;

#[derive(Parser)]
#[command(
    name = "vibecraft",
    about = "Scaffold a project and drive it phase by phase: research, design, plan, implement, review",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: nearest directory with .vibecraft/manifest.json)
    #[arg(long, global = true, env = "VIBECRAFT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project layout, module registry and manifest
    Init(cmd::init::InitArgs),

    /// Show phase progress
    Status,

    /// Print the next phase to work on, or "done"
    Next,

    /// Mark implementation sub-phase N as complete
    Complete { phase: u32 },

    /// Record a finished skill run (e.g. research_skill)
    CompleteSkill {
        skill: String,

        /// Sub-phase number; records <skill>_phase_<N>
        #[arg(long, short = 'p')]
        phase: Option<u32>,
    },

    /// Set how many implementation sub-phases the plan has
    ImplementPhases { total: u32 },

    /// Write docs/plans/development-plan.md from the modules in docs/research.md
    Plan,

    /// Manage modules
    Module {
        #[command(subcommand)]
        subcommand: ModuleSubcommand,
    },

    /// Analyze module dependencies and generate the integration layer
    Integrate {
        #[command(subcommand)]
        subcommand: IntegrateSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    tracing::debug!(root = %root.display(), "resolved project root");

    let result = match cli.command {
        Commands::Init(args) => cmd::init::run(&root, args, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Next => cmd::next::run(&root, cli.json),
        Commands::Complete { phase } => cmd::complete::implement_phase(&root, phase, cli.json),
        Commands::CompleteSkill { skill, phase } => {
            cmd::complete::skill(&root, &skill, phase, cli.json)
        }
        Commands::ImplementPhases { total } => {
            cmd::complete::implement_phases(&root, total, cli.json)
        }
        Commands::Plan => cmd::plan::run(&root, cli.json),
        Commands::Module { subcommand } => cmd::module::run(&root, subcommand, cli.json),
        Commands::Integrate { subcommand } => cmd::integrate::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

/// 2 for missing or cyclic dependencies, 3 for rejected module paths,
/// 1 for everything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<VibecraftError>() {
            if e.is_security_error() {
                return 3;
            }
            if e.is_dependency_error() {
                return 2;
            }
        }
    }
    1
}
