mod cmd;
mod output;
mod workspace;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_format, cmd_gen, cmd_info};
use output::{OutputFormat, print_error};

/// sb - generate ninja build files from BUILD.gn descriptions
#[derive(Parser)]
#[command(name = "sb")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve a target and write build.ninja into OUT_DIR
  Gen {
    /// Directory that receives build.ninja and all build products
    out_dir: PathBuf,

    /// Workspace root (default: nearest ancestor containing a WORKSPACE file)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Label of the target to generate
    #[arg(short, long, default_value = cmd::DEFAULT_TARGET)]
    target: String,

    /// Extra flag passed to every link step (repeatable)
    #[arg(long = "link-flag", allow_hyphen_values = true)]
    link_flags: Vec<String>,
  },

  /// Print the resolved dependency closure of a target
  Format {
    /// Workspace root (default: nearest ancestor containing a WORKSPACE file)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Label of the target to print
    #[arg(short, long, default_value = cmd::DEFAULT_TARGET)]
    target: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the host platform and the variables every file starts with
  Info {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn init_logging(verbose: bool) {
  let filter = match EnvFilter::try_from_default_env() {
    Ok(filter) => filter,
    Err(_) if verbose => EnvFilter::new("debug"),
    Err(_) => EnvFilter::new("warn"),
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result = match cli.command {
    Commands::Gen {
      out_dir,
      root,
      target,
      link_flags,
    } => cmd_gen(&out_dir, root, &target, link_flags),
    Commands::Format { root, target, output } => cmd_format(root, &target, output),
    Commands::Info { output } => cmd_info(output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
