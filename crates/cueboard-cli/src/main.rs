mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    action::ActionSubcommand, catalog::CatalogSubcommand, chain::ChainSubcommand,
    config::ConfigSubcommand, fields::CommandArgs, when::WhenArgs,
};
use cueboard_core::types::Namespace;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cueboard",
    about = "Compose streaming and avatar automation actions from commands, chains and conditions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .cueboard/ or .git/)
    #[arg(long, global = true, env = "CUEBOARD_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize cueboard in the current project
    Init,

    /// Inspect, validate, rename and delete stored actions
    Action {
        #[command(subcommand)]
        subcommand: ActionSubcommand,
    },

    /// Save a single plugin command as an action
    Single {
        id: String,
        /// Edit the stored action with this ID instead of failing
        #[arg(long)]
        overwrite: bool,
        #[command(flatten)]
        command: CommandArgs,
    },

    /// Save a conditional action
    When {
        id: String,
        /// Edit the stored action with this ID instead of failing
        #[arg(long)]
        overwrite: bool,
        #[command(flatten)]
        args: WhenArgs,
    },

    /// Build and reorder chains
    Chain {
        #[command(subcommand)]
        subcommand: ChainSubcommand,
    },

    /// Manage the names the resolver offers
    Catalog {
        #[command(subcommand)]
        subcommand: CatalogSubcommand,
    },

    /// List the commands and queries each plugin offers
    Kinds { namespace: Option<Namespace> },

    /// Write every stored action to a JSON file
    Export {
        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Load actions from an exported JSON file
    Import {
        file: PathBuf,
        /// Replace stored actions with the same IDs
        #[arg(long)]
        overwrite: bool,
    },

    /// Show and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Action { subcommand } => cmd::action::run(&root, subcommand, cli.json),
        Commands::Single {
            id,
            overwrite,
            command,
        } => cmd::single::run(&root, &id, overwrite, &command, cli.json),
        Commands::When {
            id,
            overwrite,
            args,
        } => cmd::when::run(&root, &id, overwrite, &args, cli.json),
        Commands::Chain { subcommand } => cmd::chain::run(&root, subcommand, cli.json),
        Commands::Catalog { subcommand } => cmd::catalog::run(&root, subcommand, cli.json),
        Commands::Kinds { namespace } => cmd::kinds::run(namespace, cli.json),
        Commands::Export { output } => cmd::transfer::export(&root, output.as_deref()),
        Commands::Import { file, overwrite } => {
            cmd::transfer::import(&root, &file, overwrite, cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
