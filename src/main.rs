use clap::{Parser, Subcommand};
use ggpack::archive::{Archive, ExtractOptions};
use log::error;
use regex::Regex;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ggpack", about = "List and extract files from ggpack containers")]
struct Cli {
    /// Log decoding details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print name and size of every embedded file
    List {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },
    /// Extract embedded files
    Extract {
        /// Only extract files whose name matches this regular expression
        #[arg(short, long)]
        pattern: Option<String>,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },
    /// Print the decoded directory as JSON
    Dump {
        input: PathBuf,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { inputs } => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let failed = for_each_input(&inputs, |path| {
                let ar = Archive::open(path)?;
                for f in ar.list()? {
                    writeln!(out, "{}\t{}", f.name, f.size)?;
                }
                Ok(())
            });
            out.flush()?;
            Ok(exit_code(failed))
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { pattern, output_dir, inputs } => {
            let opts = ExtractOptions {
                pattern: pattern.as_deref().map(Regex::new).transpose()?,
                output_dir,
            };
            let failed = for_each_input(&inputs, |path| {
                let mut ar = Archive::open(path)?;
                let n = ar.extract(&opts)?;
                println!("  extracted {} file(s) from {}", n, path.display());
                Ok(())
            });
            Ok(exit_code(failed))
        }

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { input } => {
            let ar = Archive::open(&input)?;
            println!("{}", serde_json::to_string_pretty(ar.pack().entries())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ── helpers ──────────────────────────────────────────────────────────────────

/// Run `f` on every input, reporting failures and carrying on.  Returns the
/// number of inputs that failed.
fn for_each_input<F>(inputs: &[PathBuf], mut f: F) -> usize
where
    F: FnMut(&PathBuf) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut failed = 0;
    for path in inputs {
        if let Err(e) = f(path) {
            error!("error processing {}: {}", path.display(), e);
            failed += 1;
        }
    }
    failed
}

fn exit_code(failed: usize) -> ExitCode {
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
