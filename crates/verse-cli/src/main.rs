//! Verse Images CLI - generate themed illustrations for a verse document

mod commands;
mod interrupt;
mod logging;

use clap::{Parser, Subcommand};
use commands::{generate, status};
use std::path::PathBuf;
use std::process::ExitCode;
use verse_image_gen::ProjectLayout;

#[derive(Parser)]
#[command(name = "verse-images")]
#[command(about = "Generate themed illustrations from a verse prompts document", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root containing docs/ and images/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the illustrations of a theme
    Generate(generate::GenerateArgs),

    /// Show which illustrations of a theme exist
    Status {
        /// Theme name (lowercase letters, numbers, hyphens)
        #[arg(long)]
        theme_name: String,

        /// Prompts document (defaults to docs/image-prompts.md)
        #[arg(long)]
        prompts_file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    let interrupt = match interrupt::install() {
        Ok(flag) => flag,
        Err(e) => {
            tracing::error!("Failed to install Ctrl-C handler: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let layout = ProjectLayout::new(&cli.root);
    let result = match cli.command {
        Commands::Generate(args) => generate::run(&layout, args, &interrupt),
        Commands::Status {
            theme_name,
            prompts_file,
        } => status::run(&layout, &theme_name, prompts_file),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
