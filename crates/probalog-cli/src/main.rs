mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub(crate) const COLOR_RESET: &str = "\x1b[0m";
pub(crate) const COLOR_RED: &str = "\x1b[31m";

#[derive(Parser)]
#[command(
    name = "probalog-cli",
    version,
    about = "Exact inference over ground Probalog formulas",
    long_about = None,
    subcommand_required = true,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a formula dump and print the probability of every query
    Evaluate {
        /// Formula dump file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Additional evidence, e.g. `--evidence 'path(1,5)=false'`
        #[arg(long = "evidence", value_name = "ATOM=true|false")]
        evidence: Vec<String>,
        /// Maximum number of circuit nodes
        #[arg(long = "max-nodes", value_name = "N")]
        max_nodes: Option<usize>,
        /// Compilation timeout in milliseconds
        #[arg(long = "timeout-ms", value_name = "MS")]
        timeout_ms: Option<u64>,
    },
    /// Print the weighted CNF of a formula dump in DIMACS format
    Cnf {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the compiled circuit of a formula dump in NNF format
    Nnf {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the sizes of a formula dump, its CNF and its circuit
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            file,
            evidence,
            max_nodes,
            timeout_ms,
        } => commands::evaluate(&file, &evidence, max_nodes, timeout_ms),
        Commands::Cnf { file } => commands::cnf(&file),
        Commands::Nnf { file } => commands::nnf(&file),
        Commands::Stats { file } => commands::stats(&file),
    };

    match result {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("{}error:{} {}", COLOR_RED, COLOR_RESET, e);
            std::process::exit(1);
        }
    }
}
