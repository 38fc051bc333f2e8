//! xgen CLI - Crossplane XRD and Composition generator

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "xgen")]
#[command(version)]
#[command(about = "Generate Crossplane XRDs and Compositions from provider CRDs")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the definition and compositions of every generate.yaml
    Generate {
        /// File or directory searched for generate.yaml files
        #[arg(default_value = ".")]
        input: PathBuf,

        /// Global generator configuration (defaults to INPUT/generator.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Mirror the output under this directory instead of writing next
        /// to each generate.yaml
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the claim schema and patch sets of one resource
    Inspect {
        /// generate.yaml or the directory holding it
        file: PathBuf,

        /// Global generator configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Generate {
            input,
            config,
            output_dir,
        } => commands::generate::run(&input, config.as_deref(), output_dir.as_deref()),

        Commands::Inspect { file, config } => commands::inspect::run(&file, config.as_deref()),
    };

    let code = match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

/// `RUST_LOG` filter, forced to debug by `--debug`
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
