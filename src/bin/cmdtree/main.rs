mod check;
mod invoke;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cmdtree::config_file::Schema;

#[derive(Parser, Debug)]
#[command(name = "cmdtree", about = "Run command-line interfaces described by a schema file")]
struct Cli {
    /// Path to schema file (auto-detected if not specified)
    #[arg(short, long)]
    schema: Option<String>,

    /// Log file path (enables file logging in addition to stderr)
    #[arg(long)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the schema, print the command tree and report audit findings
    Check,
    /// Print the JSON Schema of the schema file format
    JsonSchema,
    /// Execute arguments against the schema, echoing every invoked command
    Run(invoke::RunArgs),
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    cmdtree::logger::init(log_file)?;

    match cli.command {
        Commands::Check => check::run(cli.schema.as_deref()),
        Commands::JsonSchema => {
            println!("{}", serde_json::to_string_pretty(&Schema::json_schema())?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(ref args) => invoke::run(args, cli.schema.as_deref()),
    }
}
