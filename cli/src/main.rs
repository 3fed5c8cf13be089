use clap::{Parser, Subcommand};
use fssafe::FileSystemLoaderSaver;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Load and atomically replace a single file, keeping one backup
#[derive(Parser)]
#[command(name = "fssafe", version)]
struct Cli {
    /// Log commit steps (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the current artifact to stdout
    Cat { path: PathBuf },
    /// Replace the artifact with stdin
    Put { path: PathBuf },
    /// Show which generations exist on disk
    Status { path: PathBuf },
}

const EXIT_SUCCESS: u8 = 0;
/// Exit status when `cat` finds no artifact
const EXIT_NOT_FOUND: u8 = 2;

fn run(command: Command) -> Result<u8, Box<dyn std::error::Error>> {
    match command {
        Command::Cat { path } => {
            let store = FileSystemLoaderSaver::new(&path);
            if !cli::cat(&store, &mut io::stdout().lock())? {
                eprintln!("fssafe: {}: no artifact yet", path.display());
                return Ok(EXIT_NOT_FOUND);
            }
        }
        Command::Put { path } => {
            let store = FileSystemLoaderSaver::new(path);
            cli::put(&store, &mut io::stdin().lock())?;
        }
        Command::Status { path } => {
            let store = FileSystemLoaderSaver::new(path);
            for generation in cli::status(store.paths())? {
                println!("{generation}");
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match run(args.command) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("fssafe: {e}");
            ExitCode::FAILURE
        }
    }
}
